pub mod booster;
pub mod cards;
pub mod game;
pub mod protocol;

pub struct AppInfo;

impl AppInfo {
    pub const fn name() -> &'static str {
        "deckhand"
    }

    pub const fn codename() -> &'static str {
        "Table Talk"
    }

    pub const fn version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }
}

#[cfg(test)]
mod tests {
    use super::AppInfo;

    #[test]
    fn exposes_static_metadata() {
        assert_eq!(AppInfo::name(), "deckhand");
        assert_eq!(AppInfo::codename(), "Table Talk");
        assert!(!AppInfo::version().is_empty());
    }
}
