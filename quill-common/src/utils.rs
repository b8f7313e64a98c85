use openssl::rand::rand_bytes;

/// Generates an hexadecimal representation of 32 bytes of random data
pub fn random_hex() -> String {
    let mut bytes = [0; 32];
    rand_bytes(&mut bytes).expect("Error while generating random token");
    hex::encode(bytes)
}

/// Lowercases and trims a tag so that `#Art` and `art` link to the same tag
pub fn normalize_tag(name: &str) -> String {
    name.trim().trim_start_matches('#').to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_hex_length_and_charset() {
        let token = random_hex();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn tags_normalize() {
        assert_eq!(normalize_tag("  #Art "), "art");
        assert_eq!(normalize_tag("BFS"), "bfs");
        assert_eq!(normalize_tag("already"), "already");
    }
}
