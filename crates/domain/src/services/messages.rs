//! Chat message texts sent by the bot.
//!
//! Plain text only; no parse mode is applied on send, so user-provided
//! fields need no escaping.

use chrono::{DateTime, Utc};
use shared::validation::display_handle;

use crate::models::Application;

const BRAND: &str = "💎 OFB CATALOG";

pub fn welcome(first_name: Option<&str>, catalog_url: &str) -> String {
    let name = first_name.map(str::trim).filter(|n| !n.is_empty()).unwrap_or("там");
    format!(
        "👋 Привет, {}!\n\n\
         Добро пожаловать в {}\n\n\
         Премиум-каталог услуг для OnlyFans индустрии.\n\n\
         📱 Каталог: {}\n\n\
         /help - список команд",
        name, BRAND, catalog_url
    )
}

pub fn catalog(catalog_url: &str) -> String {
    format!(
        "{}\n\nПремиум-каталог услуг для OnlyFans индустрии.\n\n📱 Открыть каталог: {}",
        BRAND, catalog_url
    )
}

pub fn help() -> String {
    format!(
        "📖 Помощь - {}\n\n\
         Доступные команды:\n\
         /start - Главное меню\n\
         /catalog - Открыть каталог\n\
         /register - Регистрация кода уведомлений\n\
         /help - Это сообщение\n\n\
         Для специалистов:\n\
         1. Откройте каталог и подайте заявку\n\
         2. Дождитесь одобрения\n\
         3. Получите код вида OFB-12345678\n\
         4. Отправьте /register OFB-12345678 или просто код\n\n\
         После регистрации вы будете получать уведомления о просмотрах.",
        BRAND
    )
}

/// Catalog announcement posted and pinned by `/announce`.
pub fn announcement(catalog_url: &str) -> String {
    format!(
        "{}\n\n\
         Премиум-каталог услуг для OnlyFans индустрии\n\n\
         🎯 Категории:\n\
         • Продвижение и SMM\n\
         • Менеджмент и чартинг\n\
         • Контент и дизайн\n\
         • Безопасность данных\n\
         • Техническая поддержка\n\n\
         📱 Ссылка: {}",
        BRAND, catalog_url
    )
}

pub fn announce_denied() -> &'static str {
    "❌ Эта команда доступна только администраторам"
}

pub fn announce_published() -> &'static str {
    "✅ Объявление опубликовано и закреплено в чате!"
}

pub fn announce_failed(reason: &str) -> String {
    format!("❌ Ошибка при публикации: {}", reason)
}

pub fn register_prompt() -> &'static str {
    "🔑 Отправьте код уведомлений в формате OFB-12345678"
}

pub fn format_error() -> &'static str {
    "❌ Неверный формат кода.\n\nКод выглядит так: OFB-12345678\nПопробуйте ещё раз."
}

/// Shared reply for unknown, unpublished and already claimed codes.
pub fn code_not_found() -> &'static str {
    "❌ Код не найден или уже использован."
}

pub fn try_later() -> &'static str {
    "⚠️ Не удалось обработать запрос. Попробуйте позже."
}

pub fn registration_success(app: &Application) -> String {
    format!(
        "✅ Код успешно зарегистрирован!\n\n\
         Объявление: {}\n\
         Менеджер: {}\n\n\
         Теперь вы будете получать уведомления о просмотрах.",
        app.name,
        display_handle(&app.manager_username)
    )
}

pub fn code_for_manager(app: &Application, code: &str) -> String {
    format!(
        "🎉 Ваша заявка «{}» одобрена и опубликована в {}!\n\n\
         Код уведомлений: {}\n\n\
         Отправьте боту /register {} чтобы получать уведомления о просмотрах.",
        app.name, BRAND, code, code
    )
}

/// Fallback for admins when the manager could not be reached directly.
pub fn code_for_admin(app: &Application, code: &str) -> String {
    format!(
        "⚠️ Не удалось доставить код менеджеру.\n\n\
         Заявка: {} ({})\n\
         Менеджер: {}\n\
         Код уведомлений: {}\n\n\
         Передайте код заявителю вручную.",
        app.name,
        app.id,
        display_handle(&app.manager_username),
        code
    )
}

pub fn new_application_for_admin(app: &Application) -> String {
    format!(
        "📝 Новая заявка на размещение!\n\n\
         ID: {}\n\
         Категория: {}\n\
         Название: {}\n\
         Описание: {}\n\
         Telegram: {}",
        app.id,
        app.category,
        app.name,
        app.description,
        display_handle(&app.manager_username)
    )
}

pub fn view_notification(
    application_name: &str,
    viewer_username: Option<&str>,
    viewed_at: DateTime<Utc>,
) -> String {
    let viewer = viewer_username
        .map(str::trim)
        .filter(|h| !h.is_empty() && *h != shared::validation::ANONYMOUS_HANDLE)
        .map(display_handle)
        .unwrap_or_else(|| "пользователь".to_string());
    format!(
        "👀 Новый просмотр вашего объявления!\n\n\
         Компания: {}\n\
         Кто: {}\n\
         Время: {} UTC",
        application_name,
        viewer,
        viewed_at.format("%d.%m.%Y %H:%M")
    )
}

