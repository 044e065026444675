//! Configuration access port trait.

/// Raw key/value lookup. Typed parsing and validation live with the consumer
/// so that malformed values are reported instead of silently defaulted.
pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;

    /// Every key present in `section`, in no particular order.
    fn keys(&self, section: &str) -> Vec<String>;

    fn has_key(&self, section: &str, key: &str) -> bool {
        self.get_string(section, key).is_some()
    }
}
