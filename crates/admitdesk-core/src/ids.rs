//! Identifier generators.
//!
//! Three distinct identifier strings exist, and they are not interchangeable:
//!
//! | Identifier          | Format                         | Example              |
//! |---------------------|--------------------------------|----------------------|
//! | Admission ID        | `ADM` + `YY` + 4 random digits | `ADM254821`          |
//! | Unique ID           | `MMPSM` + 13 random digits     | `MMPSM0004829104432` |
//! | Registration number | `R-YYYY-<last4 of unique>-NNN` | `R-2025-4432-517`    |
//!
//! Admission IDs are random and are not checked against existing records;
//! a collision overwrites the earlier admission. The `*_with` variants take
//! an explicit year and RNG so output can be pinned in tests.

use rand::Rng;

use crate::clock::current_year;
use crate::errors::RepoError;

pub const ADMISSION_ID_PREFIX: &str = "ADM";
pub const UNIQUE_ID_PREFIX: &str = "MMPSM";

const UNIQUE_ID_SPACE: u64 = 10_000_000_000_000;

/// `ADM` + two-digit year + random number in `1000..=9999`.
pub fn generate_admission_id() -> String {
    admission_id_with(&mut rand::thread_rng(), current_year())
}

pub fn admission_id_with<R: Rng + ?Sized>(rng: &mut R, year: i32) -> String {
    format!(
        "{}{:02}{}",
        ADMISSION_ID_PREFIX,
        year.rem_euclid(100),
        rng.gen_range(1000..=9999)
    )
}

/// `MMPSM` + 13-digit zero-padded random number.
pub fn generate_unique_id() -> String {
    unique_id_with(&mut rand::thread_rng())
}

pub fn unique_id_with<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!("{}{:013}", UNIQUE_ID_PREFIX, rng.gen_range(0..UNIQUE_ID_SPACE))
}

/// `R-` + year + `-` + last four characters of `unique_id` + `-` + random `100..=999`.
///
/// # Errors
///
/// Returns [`RepoError::InvalidInput`] when `unique_id` is shorter than four characters.
pub fn generate_registration_no(unique_id: &str) -> Result<String, RepoError> {
    registration_no_with(&mut rand::thread_rng(), current_year(), unique_id)
}

pub fn registration_no_with<R: Rng + ?Sized>(
    rng: &mut R,
    year: i32,
    unique_id: &str,
) -> Result<String, RepoError> {
    let chars: Vec<char> = unique_id.chars().collect();
    if chars.len() < 4 {
        return Err(RepoError::invalid(format!(
            "unique id '{unique_id}' must have at least 4 characters"
        )));
    }
    let last4: String = chars[chars.len() - 4..].iter().collect();

    Ok(format!("R-{}-{}-{}", year, last4, rng.gen_range(100..=999)))
}
