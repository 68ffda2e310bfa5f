use crate::error::ContError;

/// The settled result of one execution of a continuation.
///
/// Failures travel as data on their own channel; a `Failure` with an empty
/// error list is a valid, clean termination.
#[derive(Debug, Clone)]
pub enum Outcome<A> {
    /// The value channel.
    Success(A),

    /// The termination channel, carrying zero or more errors.
    Failure(Vec<ContError>),
}

impl<A> Outcome<A> {
    /// Returns `true` for [`Outcome::Success`].
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    /// Returns `true` for [`Outcome::Failure`].
    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failure(_))
    }

    /// Returns the value, discarding errors.
    pub fn success(self) -> Option<A> {
        match self {
            Outcome::Success(value) => Some(value),
            Outcome::Failure(_) => None,
        }
    }

    /// Returns the error list, discarding a value.
    pub fn failure(self) -> Option<Vec<ContError>> {
        match self {
            Outcome::Success(_) => None,
            Outcome::Failure(errors) => Some(errors),
        }
    }

    /// Transforms a value, passing errors through.
    pub fn map<B>(self, f: impl FnOnce(A) -> B) -> Outcome<B> {
        match self {
            Outcome::Success(value) => Outcome::Success(f(value)),
            Outcome::Failure(errors) => Outcome::Failure(errors),
        }
    }

    /// Converts into a `Result` over the error list.
    pub fn into_result(self) -> Result<A, Vec<ContError>> {
        match self {
            Outcome::Success(value) => Ok(value),
            Outcome::Failure(errors) => Err(errors),
        }
    }
}

impl<A> From<Result<A, ContError>> for Outcome<A> {
    fn from(result: Result<A, ContError>) -> Self {
        match result {
            Ok(value) => Outcome::Success(value),
            Err(error) => Outcome::Failure(vec![error]),
        }
    }
}

impl<A> From<Result<A, Vec<ContError>>> for Outcome<A> {
    fn from(result: Result<A, Vec<ContError>>) -> Self {
        match result {
            Ok(value) => Outcome::Success(value),
            Err(errors) => Outcome::Failure(errors),
        }
    }
}
