//! Localized display messages (en/kz/ru). Defaults cover the full closed set
//! of supported languages; individual entries can be overridden in TOML the
//! same way prompts can.
//!
//! No raw technical error ever reaches the user: every recoverable condition
//! in the core degrades into one of these messages.

use serde::Deserialize;

use crate::domain::LangCode;

/// One message in all supported display languages.
#[derive(Clone, Debug, Deserialize)]
pub struct LocalizedText {
  pub en: String,
  pub kz: String,
  pub ru: String,
}

impl LocalizedText {
  fn new(en: &str, kz: &str, ru: &str) -> Self {
    Self {
      en: en.into(),
      kz: kz.into(),
      ru: ru.into(),
    }
  }

  pub fn get(&self, lang: LangCode) -> &str {
    match lang {
      LangCode::En => &self.en,
      LangCode::Kz => &self.kz,
      LangCode::Ru => &self.ru,
    }
  }
}

/// The full message table. Field defaults are applied per entry, so a TOML
/// override may replace a single message without restating the rest.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Messages {
  pub lang_set: LocalizedText,
  pub no_lang: LocalizedText,
  pub mission_started: LocalizedText,
  pub xp_gain: LocalizedText,
  pub correct_answer: LocalizedText,
  pub incorrect_try_again: LocalizedText,
  pub answer_incorrect: LocalizedText,
  pub wrong_input_type: LocalizedText,
  pub stale_stage: LocalizedText,
  pub completed_all: LocalizedText,
  pub progress: LocalizedText,
}

impl Default for Messages {
  fn default() -> Self {
    Self {
      lang_set: LocalizedText::new(
        "Your native language is set to {lang}.",
        "Сіздің ана тіліңіз {lang} деп орнатылды.",
        "Ваш родной язык установлен на {lang}.",
      ),
      no_lang: LocalizedText::new(
        "Please select your native language first.",
        "Алдымен ана тіліңізді таңдаңыз.",
        "Сначала выберите родной язык.",
      ),
      mission_started: LocalizedText::new(
        "Mission {mission} started.",
        "Миссия {mission} басталды.",
        "Миссия {mission} началась.",
      ),
      xp_gain: LocalizedText::new("+{xp} XP! 🎉", "+{xp} XP! 🎉", "+{xp} XP! 🎉"),
      correct_answer: LocalizedText::new("Correct! ✓", "Дұрыс! ✓", "Правильно! ✓"),
      incorrect_try_again: LocalizedText::new(
        "Incorrect. Try again.",
        "Қате. Қайтадан көріңіз.",
        "Неправильно. Попробуйте еще раз.",
      ),
      answer_incorrect: LocalizedText::new(
        "Your answer is not correct. Please try again.",
        "Сіздің жауабыңыз дұрыс емес. Қайтадан көріңіз.",
        "Ваш ответ неправильный. Попробуйте еще раз.",
      ),
      wrong_input_type: LocalizedText::new(
        "This stage requires a different input type.",
        "Бұл кезең басқа енгізу түрін қажет етеді.",
        "На этом этапе требуется другой тип ввода.",
      ),
      stale_stage: LocalizedText::new(
        "This is not the current stage.",
        "Бұл ағымдағы кезең емес.",
        "Это не текущий этап.",
      ),
      completed_all: LocalizedText::new(
        "🎉 You completed all missions! Congratulations!",
        "🎉 Барлық миссияларды аяқтадыңыз! Құттықтаймыз!",
        "🎉 Вы выполнили все задания! Поздравляем!",
      ),
      progress: LocalizedText::new(
        "📊 Your Progress:\nLevel: {level}\nTotal XP: {xp}\nXP to next level: {xp_to_next}",
        "📊 Сіздің ілгерілеуіңіз:\nДеңгей: {level}\nБарлық XP: {xp}\nКелесі деңгейге XP: {xp_to_next}",
        "📊 Ваш прогресс:\nУровень: {level}\nОбщее XP: {xp}\nXP до следующего уровня: {xp_to_next}",
      ),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn every_language_resolves() {
    let m = Messages::default();
    for lang in [LangCode::En, LangCode::Kz, LangCode::Ru] {
      assert!(!m.no_lang.get(lang).is_empty());
      assert!(m.progress.get(lang).contains("{xp_to_next}"));
    }
  }
}
