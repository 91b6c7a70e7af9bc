use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MechanicsErrorKind {
    OutOfRange,
    NotPrime,
    Exhausted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MechanicsError {
    pub kind: MechanicsErrorKind,
    pub number: Option<i64>,
    pub message: String,
}

impl MechanicsError {
    pub fn new(kind: MechanicsErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            number: None,
            message: message.into(),
        }
    }

    pub fn with_number(mut self, number: i64) -> Self {
        self.number = Some(number);
        self
    }
}

impl fmt::Display for MechanicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for MechanicsError {}

pub fn out_of_range(number: i64) -> MechanicsError {
    MechanicsError::new(
        MechanicsErrorKind::OutOfRange,
        format!("number out of valid range ({number})"),
    )
    .with_number(number)
}

pub fn not_prime(number: i64) -> MechanicsError {
    MechanicsError::new(
        MechanicsErrorKind::NotPrime,
        format!("not a prime number ({number})"),
    )
    .with_number(number)
}

pub fn exhausted(pool: &str) -> MechanicsError {
    MechanicsError::new(
        MechanicsErrorKind::Exhausted,
        format!("no numbers available in {pool} pool"),
    )
}
