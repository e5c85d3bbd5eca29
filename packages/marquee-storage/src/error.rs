#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Sqlx(#[from] sqlx::Error),
	#[error("Invalid argument: {0}")]
	InvalidArgument(String),
	#[error(transparent)]
	Expression(#[from] marquee_domain::fulltext::ParseError),
}
impl Error {
	/// Connection-level failures that may succeed on a second attempt.
	pub fn is_transient(&self) -> bool {
		matches!(
			self,
			Self::Sqlx(
				sqlx::Error::Io(_)
					| sqlx::Error::PoolTimedOut
					| sqlx::Error::PoolClosed
					| sqlx::Error::WorkerCrashed
			)
		)
	}
}
