use bytesize::ByteSize;

/// Binary-unit rendering of a byte count, e.g. `1.5 KiB`.
pub fn human_bytes(b: impl Into<u128>) -> String {
    let b: u128 = b.into();
    ByteSize::b(u64::try_from(b).unwrap_or(u64::MAX)).to_string_as(true)
}
