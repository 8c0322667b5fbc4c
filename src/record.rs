use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AnnotationRecord {
    pub id: String,
    pub file_name: String,
    pub original_name: String,
    pub created: DateTime<Utc>,
    pub expiry: NaiveDate,
    pub slug: String,
    pub description: String,
    pub public_url: String,
    pub file_size: String,
    pub custom_image: bool,
    pub preview_title: String,
    pub preview_description: String,
}

const ID_CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

fn random_token(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| ID_CHARS[rng.gen_range(0..ID_CHARS.len())] as char)
        .collect()
}

// Two independent tokens, matching the shape of the ids this tool has
// always produced. Uniqueness is probabilistic, not enforced.
pub fn generate_file_id() -> String {
    format!("{}{}", random_token(8), random_token(8))
}

pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    let exp = ((bytes as f64).ln() / 1024f64.ln()).floor() as usize;
    let exp = exp.min(UNITS.len() - 1);
    let value = bytes as f64 / 1024f64.powi(exp as i32);
    let rendered = format!("{:.2}", value);
    let rendered = rendered.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", rendered, UNITS[exp])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_id_is_sixteen_lowercase_alphanumerics() {
        let id = generate_file_id();
        assert_eq!(id.len(), 16);
        assert!(id
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit()));
    }

    #[test]
    fn file_ids_differ_between_calls() {
        assert_ne!(generate_file_id(), generate_file_id());
    }

    #[test]
    fn zero_bytes_has_its_own_label() {
        assert_eq!(format_file_size(0), "0 Bytes");
    }

    #[test]
    fn sizes_use_binary_units_with_trimmed_decimals() {
        assert_eq!(format_file_size(532), "532 Bytes");
        assert_eq!(format_file_size(1024), "1 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(1234), "1.21 KB");
        assert_eq!(format_file_size(5 * 1024 * 1024), "5 MB");
        assert_eq!(format_file_size(3 * 1024 * 1024 * 1024), "3 GB");
    }
}
