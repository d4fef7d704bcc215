//! SMS segmentation: encoding detection and part counting

use std::collections::HashSet;

use once_cell::sync::Lazy;

use crate::types::{Encoding, MessageSegmentation};

/// GSM 03.38 default alphabet (basic table only) plus CR, LF and TAB.
/// Extension-table characters such as `{`, `[` or `€` force Unicode.
const GSM7_ALPHABET: &str = "@£$¥èéùìòÇØøÅåΔ_ΦΓΛΩΠΨΣΘΞÆæßÉ !\"#¤%&'()*+,-./0123456789:;<=>?¡ABCDEFGHIJKLMNOPQRSTUVWXYZÄÖÑÜ§¿abcdefghijklmnopqrstuvwxyzäöñüà\n\r\t";

static GSM7_CHARS: Lazy<HashSet<char>> = Lazy::new(|| GSM7_ALPHABET.chars().collect());

pub fn detect_encoding(text: &str) -> Encoding {
    if text.chars().all(|c| GSM7_CHARS.contains(&c)) {
        Encoding::Gsm7
    } else {
        Encoding::Unicode
    }
}

pub fn segment_message(text: &str) -> MessageSegmentation {
    let encoding = detect_encoding(text);
    let length = text.chars().count();
    let part_size = encoding.part_size();

    MessageSegmentation {
        encoding,
        length,
        part_count: length.div_ceil(part_size),
    }
}

/// Estimated cost of sending `segmentation` to `recipients` numbers at
/// `unit_price` per part.
pub fn estimate_cost(segmentation: &MessageSegmentation, recipients: usize, unit_price: f64) -> f64 {
    segmentation.part_count as f64 * recipients as f64 * unit_price
}
