//! Built-in mission content. Guarantees the app is useful even without an
//! external missions directory.

use crate::domain::{ChoiceOption, GradingSpec, LanguageLevel, Mission, Stage, StageInput};

fn choice(text: &str, correct: bool) -> ChoiceOption {
  ChoiceOption {
    text: text.into(),
    correct,
  }
}

/// The default café quest: five turns, alternating choice and free-text
/// stages. Reward splits evenly at 10 XP per stage.
pub fn seed_mission() -> Mission {
  Mission {
    title: "At the café".into(),
    reward_xp: 50,
    stages: vec![
      Stage {
        npc_text: "Tom: Hello! How are you today?".into(),
        input: StageInput::MultipleChoice {
          options: vec![
            choice("Me is fine.", false),
            choice("I am fine, thank you!", true),
            choice("I fine am.", false),
          ],
        },
        explanation: Some(
          "\"I am fine, thank you!\" is the full polite answer: subject, verb, adjective.".into(),
        ),
        pre_stage_hint: None,
      },
      Stage {
        npc_text: "Waiter: Welcome! What would you like to drink?".into(),
        input: StageInput::MultipleChoice {
          options: vec![
            choice("I want a coffee, please.", true),
            choice("Me want coffee.", false),
            choice("Coffee me.", false),
          ],
        },
        explanation: Some("Use \"I want a ... , please\" to order politely.".into()),
        pre_stage_hint: None,
      },
      Stage {
        npc_text: "Waiter: And for your friend? Tell me what Tom wants.".into(),
        input: StageInput::FreeText {
          grading: GradingSpec {
            goal: "Order milk for a friend using the third person".into(),
            level: LanguageLevel::A1,
            allowed_patterns: vec![
              "He wants + noun".into(),
              "My friend wants + noun".into(),
            ],
            required_elements: vec!["wants".into(), "milk".into()],
            examples: vec![
              "He wants milk, please.".into(),
              "My friend wants a glass of milk.".into(),
            ],
          },
        },
        explanation: None,
        pre_stage_hint: Some("(Tom answered: I want milk)".into()),
      },
      Stage {
        npc_text: "Waiter: Anything else for you two?".into(),
        input: StageInput::MultipleChoice {
          options: vec![
            choice("No thanks you.", false),
            choice("No, thank you. That's all.", true),
            choice("Nothing more me.", false),
          ],
        },
        explanation: Some("\"No, thank you. That's all.\" politely closes the order.".into()),
        pre_stage_hint: None,
      },
      Stage {
        npc_text: "Waiter: Here is your bill. How would you like to pay?".into(),
        input: StageInput::FreeText {
          grading: GradingSpec {
            goal: "Say how you will pay".into(),
            level: LanguageLevel::A1,
            allowed_patterns: vec![
              "I will pay + by/in/with + noun".into(),
              "I'd like to pay + by/in/with + noun".into(),
            ],
            required_elements: vec!["pay".into()],
            examples: vec![
              "I will pay by card.".into(),
              "I'd like to pay in cash, please.".into(),
            ],
          },
        },
        explanation: None,
        pre_stage_hint: None,
      },
    ],
  }
}
