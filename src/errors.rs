use thiserror::Error;

/// Malformed inline-button payload.
#[derive(Debug, Error, PartialEq)]
pub enum PayloadError {
    #[error("неверный формат данных: {0}")]
    Layout(String),

    #[error("неизвестное действие: {0}")]
    UnknownAction(String),

    #[error("неверный номер: {0}")]
    Index(String),

    #[error("неверная кодировка ID выплаты: {0}")]
    Encoding(String),
}

/// Errors surfaced to the operator who clicked a button. Each one aborts
/// that interaction only.
#[derive(Debug, Error, PartialEq)]
pub enum InteractionError {
    #[error("Некорректные данные кнопки: {0}")]
    MalformedPayload(#[from] PayloadError),

    #[error("Позиции #{} больше нет, сейчас в обработке {} выплат", .index + 1, .len)]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Не удалось отменить выплату {id}: {reason}")]
    EvictionFailed { id: String, reason: String },

    #[error("Не удалось принять выплату {id}: {reason}")]
    AcceptFailed { id: String, reason: String },
}
