use thiserror::Error;

/// Everything that can go wrong talking to the backend.
///
/// Call sites never surface these directly: each operation reduces any
/// failure to one generic localized message via [`Operation::user_message`].
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("invalid base url: {0}")]
    InvalidBaseUrl(String),
    #[error("blob is not an image (declared type: {0})")]
    NotAnImage(String),
    #[error("transport: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server returned status {0}")]
    Status(u16),
    #[error("malformed response body: {0}")]
    MalformedBody(String),
}

/// The UI-level intent behind a gateway call, used to pick the
/// user-facing failure message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Recognize,
    Mark,
    Report,
    Reset,
    ListStudents,
    ExportCsv,
    Health,
}

impl Operation {
    /// Generic localized message shown for any failure of this
    /// operation. No structured error detail reaches the user; the
    /// detail goes to tracing instead.
    pub fn user_message(self) -> &'static str {
        match self {
            Operation::Recognize => "Erreur lors de la reconnaissance",
            Operation::Mark => "Erreur lors du marquage de présence",
            Operation::Report => "Erreur lors de la récupération du rapport",
            Operation::Reset => "Erreur lors de la réinitialisation",
            Operation::ListStudents => "Erreur lors de la récupération des étudiants",
            Operation::ExportCsv => "Erreur lors de l'export CSV",
            Operation::Health => "Erreur lors de la vérification du service",
        }
    }
}
