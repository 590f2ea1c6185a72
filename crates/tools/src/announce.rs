use std::path::{Path, PathBuf};

pub const DEFAULT_BASE_URL: &str = "https://arbakker.github.io/dagelijkse-gemeente-bot";

/// Daily post for one region: status text plus the rendered map to attach.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Announcement {
    pub code: String,
    pub message: String,
    pub image_path: PathBuf,
}

impl Announcement {
    pub fn for_code(code: &str, base_url: &str, maps_dir: impl AsRef<Path>) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            code: code.to_string(),
            message: format!("Gemeente {code}: {base}/#gmcode={code}"),
            image_path: maps_dir.as_ref().join(format!("{code}.png")),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::{Announcement, DEFAULT_BASE_URL};

    #[test]
    fn links_to_the_viewer() {
        let a = Announcement::for_code("GM0344", DEFAULT_BASE_URL, "../atlas/maps");
        assert_eq!(
            a.message,
            "Gemeente GM0344: https://arbakker.github.io/dagelijkse-gemeente-bot/#gmcode=GM0344"
        );
        assert_eq!(a.image_path, PathBuf::from("../atlas/maps/GM0344.png"));
    }

    #[test]
    fn trailing_slash_is_not_doubled() {
        let a = Announcement::for_code("GM0014", "http://localhost:8080/", "maps");
        assert_eq!(a.message, "Gemeente GM0014: http://localhost:8080/#gmcode=GM0014");
    }
}
