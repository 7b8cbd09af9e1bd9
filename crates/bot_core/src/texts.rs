//! User-facing strings.

pub const GREETING: &str = "Привет, я Фырка - бот для знакомств в чате Flood e2! \
Чтобы продолжить давайте познакомимся: ниже я отправила вашу анкету, которую вам надо будет заполнить. \
Не стесняйтесь рассказать о себе, чем лучше вы распишите что вас интересует, тем больше людей будут \
рады пообщаться с вами! Давайте приступим:";

pub const ASK_NAME: &str = "Привет, это бот для знакомств в чате Flood e2! \
Чтобы продолжить давайте познакомимся, как вас зовут? (имя + фамилия / никнейм)";
pub const ASK_PRONOUNS: &str = "Какие местоимения вы используете?";
pub const ASK_DESCRIPTION: &str = "Расскажите о себе: откуда вы, какие у вас хобби, чем занимаетесь в жизни, \
что вас мотивирует, какие планы на жизнь, что хотите от знакомства";
pub const ASK_PHOTO: &str = "И для завершения отправьте аватарку которую вы хотите использовать";
pub const PHOTO_REQUIRED: &str = "Отправьте пожалуйста изображение, не документ/стикер/текст";

pub const EDIT_PHOTO_PROMPT: &str = "Чтобы изменить изображение отправьте пожалуйста фото \
(не документ/стикер/текст) которое вы хотите ассоциировать с вами. Это можете быть вы, ваш персонаж, \
или ваше тотемное животное! Когда будете готовы можете отправлять!";
pub const EDIT_PHOTO_RETRY: &str = "\n\nОтправьте пожалуйста **изображение**, не документ/стикер/текст";

pub const EDIT_TEXT_PROMPT: &str = "Чтобы изменить данные отправьте пожалуйста сообщение \
(не документ/стикер/фото) которое вы хотите ассоциировать с вами";
pub const EDIT_TEXT_RETRY: &str = "\n\nОтправьте пожалуйста **сообщение**, не документ/стикер/фото";

pub const FALLBACK: &str = "L";

pub fn edit_photo_retry() -> String {
    format!("{EDIT_PHOTO_PROMPT}{EDIT_PHOTO_RETRY}")
}

pub fn edit_text_retry() -> String {
    format!("{EDIT_TEXT_PROMPT}{EDIT_TEXT_RETRY}")
}

pub fn hello_username(username: &str) -> String {
    format!("Hello @{username}")
}

/// MarkdownV2 mention that links to the user's chat.
pub fn mention(first_name: &str, user_id: i64) -> String {
    format!("[{}](tg://user?id={user_id})", escape_markdown_v2(first_name))
}

pub fn stats(total: u64, complete: u64, active_dialogues: usize) -> String {
    format!(
        "Анкет: {total}\nЗаполнено полностью: {complete}\nАктивных диалогов: {active_dialogues}"
    )
}

fn escape_markdown_v2(text: &str) -> String {
    const SPECIAL: &[char] = &[
        '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
        '\\',
    ];
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if SPECIAL.contains(&ch) {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mention_escapes_markdown() {
        assert_eq!(mention("Ann", 5), "[Ann](tg://user?id=5)");
        assert_eq!(mention("a_b.c", 1), "[a\\_b\\.c](tg://user?id=1)");
    }

    #[test]
    fn retry_prompts_extend_the_base_prompt() {
        assert!(edit_photo_retry().starts_with(EDIT_PHOTO_PROMPT));
        assert!(edit_text_retry().ends_with(EDIT_TEXT_RETRY));
    }
}
