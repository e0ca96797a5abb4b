// DNS message header + first question name

use crate::models::domain::DecodedLayer;

pub const HEADER_LEN: usize = 12;

const QR_FLAG: u16 = 0x8000;
const POINTER_MASK: u8 = 0xC0;
const MAX_LABEL_LEN: usize = 63;
const MAX_POINTER_JUMPS: usize = 16;

/// Anything carrying a full header on a DNS port counts as DNS; the question
/// name is best effort.
pub fn parse_message(message: &[u8]) -> Option<DecodedLayer> {
    if message.len() < HEADER_LEN {
        return None;
    }

    let id = u16::from_be_bytes([message[0], message[1]]);
    let flags = u16::from_be_bytes([message[2], message[3]]);
    let question_count = u16::from_be_bytes([message[4], message[5]]);

    let query = if question_count > 0 {
        read_name(message, HEADER_LEN)
    } else {
        None
    };

    Some(DecodedLayer::Dns {
        id,
        is_response: flags & QR_FLAG != 0,
        query,
    })
}

fn read_name(message: &[u8], mut pos: usize) -> Option<String> {
    let mut labels: Vec<String> = Vec::with_capacity(4);
    let mut jumps = 0;

    loop {
        let len = *message.get(pos)?;

        if len == 0 {
            break;
        }

        // compression pointer: 14-bit offset from the start of the message
        if len & POINTER_MASK == POINTER_MASK {
            jumps += 1;
            if jumps > MAX_POINTER_JUMPS {
                return None;
            }
            let low = *message.get(pos + 1)?;
            pos = (usize::from(len & !POINTER_MASK) << 8) | usize::from(low);
            continue;
        }

        let len = usize::from(len);
        if len > MAX_LABEL_LEN {
            return None;
        }
        let label = message.get(pos + 1..pos + 1 + len)?;
        labels.push(String::from_utf8_lossy(label).into_owned());
        pos += 1 + len;
    }

    if labels.is_empty() {
        return Some(".".to_string());
    }
    Some(labels.join("."))
}
