use marquee_storage::models::MediaItem;

pub const NOTHING_FOUND: &str = "К сожалению, ничего не найдено";
pub const SESSION_RESET: &str = "Параметры сброшены";

pub fn recommendation(item: &MediaItem) -> String {
	let mut text = format!("Рекомендую посмотреть {}", item.name);

	if let Some(person) = item.persons.iter().find(|person| !person.name.trim().is_empty()) {
		text.push_str(" от ");
		text.push_str(person.name.trim());
	}
	if let Some(year) = item.year {
		text.push_str(&format!(" {year} года"));
	}

	text
}
