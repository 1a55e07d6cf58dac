//! # Translate Command

use cert_mirror_controller::translate::{IdentifierTranslator, SuffixTranslator};

pub fn translate_command(name: &str, namespace: &str, suffix: &str) {
    println!("{}", SuffixTranslator::new(suffix).physical_name(name, namespace));
}
