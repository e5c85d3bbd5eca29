pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Malformed turn: {message}")]
	MalformedTurn { message: String },
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Search unavailable: {message}")]
	SearchUnavailable { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
}
impl Error {
	/// Whether a second attempt at the same search could succeed.
	pub fn is_transient(&self) -> bool {
		matches!(self, Self::SearchUnavailable { .. })
	}
}
impl From<marquee_storage::Error> for Error {
	fn from(err: marquee_storage::Error) -> Self {
		if err.is_transient() {
			return Self::SearchUnavailable { message: err.to_string() };
		}

		match err {
			marquee_storage::Error::Sqlx(inner) => Self::Storage { message: inner.to_string() },
			marquee_storage::Error::InvalidArgument(message) => Self::InvalidRequest { message },
			marquee_storage::Error::Expression(inner) =>
				Self::InvalidRequest { message: inner.to_string() },
		}
	}
}
