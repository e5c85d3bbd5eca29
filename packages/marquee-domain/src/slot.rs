use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Bumped whenever a slot is added to or removed from [`SlotName::ALL`].
pub const SLOT_SCHEMA_VERSION: u32 = 1;

const ABSENT: SlotValue = SlotValue::Absent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SlotName {
	Genre,
	Origin,
	Period,
	Persons,
	Name,
}
impl SlotName {
	pub const ALL: [Self; 5] = [Self::Genre, Self::Origin, Self::Period, Self::Persons, Self::Name];

	/// Parameter name used by the assistant platform's slot filling.
	pub fn param(self) -> &'static str {
		match self {
			Self::Genre => "movie-genre",
			Self::Origin => "movie-origin",
			Self::Period => "date-period",
			Self::Persons => "movie-persons",
			Self::Name => "movie-name",
		}
	}

	pub fn from_param(name: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|slot| slot.param() == name)
	}

	/// The only value variant this slot may hold.
	pub fn expected_kind(self) -> &'static str {
		match self {
			Self::Period => "period",
			Self::Genre | Self::Origin | Self::Persons | Self::Name => "text",
		}
	}

	pub fn accepts(self, value: &SlotValue) -> bool {
		match value {
			SlotValue::Absent => true,
			SlotValue::Text(_) => self != Self::Period,
			SlotValue::Period(_) => self == Self::Period,
		}
	}
}
impl fmt::Display for SlotName {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.param())
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
	pub start: Option<String>,
	pub end: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SlotValue {
	#[default]
	Absent,
	Text(String),
	Period(Period),
}
impl SlotValue {
	pub fn text(value: impl Into<String>) -> Self {
		Self::Text(value.into()).normalized()
	}

	pub fn period(start: Option<String>, end: Option<String>) -> Self {
		Self::Period(Period { start, end }).normalized()
	}

	/// Collapses zero values to [`SlotValue::Absent`] and trims text.
	pub fn normalized(self) -> Self {
		match self {
			Self::Absent => Self::Absent,
			Self::Text(text) => {
				let trimmed = text.trim();

				if trimmed.is_empty() { Self::Absent } else { Self::Text(trimmed.to_string()) }
			},
			Self::Period(Period { start, end }) => {
				let start = non_blank(start);
				let end = non_blank(end);

				if start.is_none() && end.is_none() {
					Self::Absent
				} else {
					Self::Period(Period { start, end })
				}
			},
		}
	}

	pub fn kind(&self) -> &'static str {
		match self {
			Self::Absent => "absent",
			Self::Text(_) => "text",
			Self::Period(_) => "period",
		}
	}

	pub fn as_text(&self) -> Option<&str> {
		match self {
			Self::Text(text) => Some(text.as_str()),
			_ => None,
		}
	}

	pub fn as_period(&self) -> Option<&Period> {
		match self {
			Self::Period(period) => Some(period),
			_ => None,
		}
	}

	/// Decodes a platform parameter value.
	///
	/// Strings and `{startDate, endDate}` objects are the shapes slot filling produces. A list is
	/// reduced to its first non-blank string. Anything else is rejected instead of being read as
	/// an empty slot.
	pub fn from_json(value: &Value) -> Result<Self, SlotShapeError> {
		match value {
			Value::Null => Ok(Self::Absent),
			Value::String(text) => Ok(Self::text(text.as_str())),
			Value::Array(items) => {
				for item in items {
					match item {
						Value::String(text) if !text.trim().is_empty() =>
							return Ok(Self::text(text.as_str())),
						Value::String(_) | Value::Null => {},
						other => return Err(SlotShapeError::new(other)),
					}
				}

				Ok(Self::Absent)
			},
			Value::Object(map) => {
				if map.is_empty() {
					return Ok(Self::Absent);
				}

				let start = map.get("startDate");
				let end = map.get("endDate");

				if start.is_none() && end.is_none() {
					return Err(SlotShapeError::new(value));
				}

				Ok(Self::period(period_bound(start)?, period_bound(end)?))
			},
			other => Err(SlotShapeError::new(other)),
		}
	}

	/// Decodes a platform parameter value for `slot`, rejecting a variant the slot cannot hold.
	pub fn decode(slot: SlotName, raw: &Value) -> Result<Self, SlotShapeError> {
		let value = Self::from_json(raw)?;

		if !slot.accepts(&value) {
			return Err(SlotShapeError::Mismatch {
				slot,
				expected: slot.expected_kind(),
				actual: value.kind(),
			});
		}

		Ok(value)
	}
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SlotShapeError {
	#[error("Unsupported slot value shape: {kind}.")]
	Unsupported { kind: &'static str },
	#[error("Slot {slot} expects {expected}, got {actual}.")]
	Mismatch { slot: SlotName, expected: &'static str, actual: &'static str },
}
impl SlotShapeError {
	fn new(value: &Value) -> Self {
		let kind = match value {
			Value::Null => "null",
			Value::Bool(_) => "boolean",
			Value::Number(_) => "number",
			Value::String(_) => "string",
			Value::Array(_) => "array",
			Value::Object(_) => "object",
		};

		Self::Unsupported { kind }
	}
}

/// Latest known value of every recognized slot in one conversation.
///
/// Absent slots are not stored, so two sets holding the same supplied values compare equal no
/// matter how they were built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotSet {
	values: BTreeMap<SlotName, SlotValue>,
}
impl SlotSet {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn get(&self, name: SlotName) -> &SlotValue {
		self.values.get(&name).unwrap_or(&ABSENT)
	}

	pub fn text(&self, name: SlotName) -> Option<&str> {
		self.get(name).as_text()
	}

	/// Stores `value`, or clears the slot when it is absent. A variant the slot cannot hold is
	/// dropped and the stored value kept.
	pub fn set(&mut self, name: SlotName, value: SlotValue) {
		if !name.accepts(&value) {
			tracing::warn!(
				slot = %name,
				expected = name.expected_kind(),
				actual = value.kind(),
				"Ignoring slot value of the wrong kind."
			);

			return;
		}

		match value.normalized() {
			SlotValue::Absent => {
				self.values.remove(&name);
			},
			value => {
				self.values.insert(name, value);
			},
		}
	}

	pub fn with(mut self, name: SlotName, value: SlotValue) -> Self {
		self.set(name, value);

		self
	}

	/// Applies one turn's slots: a supplied value overwrites, an absent one keeps what is stored.
	pub fn merge(&mut self, incoming: &SlotSet) {
		for (name, value) in &incoming.values {
			self.values.insert(*name, value.clone());
		}
	}

	pub fn is_empty(&self) -> bool {
		self.values.is_empty()
	}

	pub fn len(&self) -> usize {
		self.values.len()
	}
}
impl FromIterator<(SlotName, SlotValue)> for SlotSet {
	fn from_iter<I: IntoIterator<Item = (SlotName, SlotValue)>>(iter: I) -> Self {
		let mut set = Self::new();

		for (name, value) in iter {
			set.set(name, value);
		}

		set
	}
}

fn non_blank(value: Option<String>) -> Option<String> {
	value.map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}

fn period_bound(value: Option<&Value>) -> Result<Option<String>, SlotShapeError> {
	match value {
		None | Some(Value::Null) => Ok(None),
		Some(Value::String(text)) => Ok(Some(text.clone())),
		Some(other) => Err(SlotShapeError::new(other)),
	}
}
