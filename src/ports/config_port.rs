//! Configuration access port.
//!
//! Adapters only hand back raw strings; typing, defaults and validation
//! live in `domain::config`, so every source reports bad values the same way.

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn has_section(&self, section: &str) -> bool;
}
