//! Small helpers shared across the engine.

use rand::{distributions::Alphanumeric, Rng};

use crate::db_types::ExternalRef;

const EXTERNAL_REF_TOKEN_LEN: usize = 24;

/// Mints a fresh external reference. 24 alphanumeric characters gives a collision probability that is negligible
/// for any realistic order volume.
pub fn new_external_ref() -> ExternalRef {
    let token: String =
        rand::thread_rng().sample_iter(&Alphanumeric).take(EXTERNAL_REF_TOKEN_LEN).map(char::from).collect();
    ExternalRef::new(format!("sps-{token}"))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn references_are_unique_and_well_formed() {
        let a = new_external_ref();
        let b = new_external_ref();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("sps-"));
        assert_eq!(a.as_str().len(), 4 + EXTERNAL_REF_TOKEN_LEN);
    }
}
