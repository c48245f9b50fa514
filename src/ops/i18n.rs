use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use crate::io::store::{Key, Store, StoreError};

/// UI languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    En,
    Es,
    Ar,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::En, Language::Es, Language::Ar];

    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Es => "es",
            Language::Ar => "ar",
        }
    }

    pub fn from_code(code: &str) -> Option<Language> {
        match code {
            "en" => Some(Language::En),
            "es" => Some(Language::Es),
            "ar" => Some(Language::Ar),
            _ => None,
        }
    }

    /// Native name of the language
    pub fn name(self) -> &'static str {
        match self {
            Language::En => "English",
            Language::Es => "Español",
            Language::Ar => "العربية",
        }
    }

    pub fn is_rtl(self) -> bool {
        self == Language::Ar
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// key, en, es, ar. An empty cell falls back to English.
const CATALOG: &[(&str, &str, &str, &str)] = &[
    ("project", "project", "proyecto", "مشروع"),
    ("task", "task", "tarea", "مهمة"),
    ("someone", "Someone", "Alguien", "شخص ما"),
    ("unknown_user", "Unknown User", "Usuario desconocido", "مستخدم غير معروف"),
    ("comments", "Comments", "Comentarios", "التعليقات"),
    ("no_comments", "No comments yet", "Aún no hay comentarios", "لا توجد تعليقات بعد"),
    ("edited", "edited", "editado", "تم التعديل"),
    ("reply", "Reply", "Responder", "رد"),
    ("notifications", "Notifications", "Notificaciones", "الإشعارات"),
    ("no_notifications", "No notifications", "No hay notificaciones", "لا توجد إشعارات"),
    ("not_started", "Not Started", "No Iniciado", "لم يبدأ"),
    ("in_progress", "In Progress", "En Progreso", "قيد التنفيذ"),
    ("completed", "Completed", "Completado", "مكتمل"),
    ("low", "Low", "Baja", "منخفضة"),
    ("medium", "Medium", "Media", "متوسطة"),
    ("high", "High", "Alta", "عالية"),
    ("deadline", "Deadline", "Fecha límite", "الموعد النهائي"),
    ("assigned_to", "Assigned to", "Asignado a", "مسند إلى"),
    ("unassigned", "Unassigned", "Sin asignar", "غير مسند"),
    ("overdue", "Overdue", "Vencidas", "متأخرة"),
    ("upcoming_deadlines", "Upcoming deadlines", "Próximas fechas límite", "المواعيد النهائية القادمة"),
    (
        "task_in_project",
        "{task} in project \"{project}\"",
        "{task} en el proyecto \"{project}\"",
        "{task} في المشروع \"{project}\"",
    ),
    (
        "notif_mention_title",
        "You were mentioned in a comment",
        "Te mencionaron en un comentario",
        "تمت الإشارة إليك في تعليق",
    ),
    (
        "notif_mention_message",
        "{author} mentioned you in a comment on {entity_type} \"{entity}\"",
        "{author} te mencionó en un comentario en {entity_type} \"{entity}\"",
        "أشار إليك {author} في تعليق على {entity_type} \"{entity}\"",
    ),
    (
        "notif_comment_title",
        "New comment on your {entity_type}",
        "Nuevo comentario en tu {entity_type}",
        "تعليق جديد على {entity_type} الخاص بك",
    ),
    (
        "notif_comment_message",
        "{author} commented on your {entity_type} \"{entity}\"",
        "{author} comentó en tu {entity_type} \"{entity}\"",
        "علّق {author} على {entity_type} \"{entity}\" الخاص بك",
    ),
    (
        "notif_reply_title",
        "New reply to your comment",
        "Nueva respuesta a tu comentario",
        "رد جديد على تعليقك",
    ),
    (
        "notif_reply_message",
        "{author} replied to your comment",
        "{author} respondió a tu comentario",
        "رد {author} على تعليقك",
    ),
    (
        "notif_assigned_title",
        "New Task Assigned",
        "Nueva tarea asignada",
        "تم إسناد مهمة جديدة",
    ),
    (
        "notif_assigned_message",
        "You have been assigned to task \"{task}\" in project \"{project}\".",
        "Se te ha asignado la tarea \"{task}\" en el proyecto \"{project}\".",
        "تم إسناد المهمة \"{task}\" إليك في المشروع \"{project}\".",
    ),
    (
        "notif_deadline_title",
        "Upcoming Deadline: {task}",
        "Fecha límite próxima: {task}",
        "موعد نهائي قريب: {task}",
    ),
    (
        "notif_deadline_message",
        "Task \"{task}\" in project \"{project}\" is due soon.",
        "La tarea \"{task}\" del proyecto \"{project}\" vence pronto.",
        "المهمة \"{task}\" في المشروع \"{project}\" تستحق قريبًا.",
    ),
    (
        "notif_welcome_title",
        "Welcome to Project Management System",
        "Bienvenido al Sistema de Gestión de Proyectos",
        "مرحبًا بك في نظام إدارة المشاريع",
    ),
    (
        "notif_welcome_message",
        "This is a sample notification to help you get started.",
        "Esta es una notificación de ejemplo para ayudarte a comenzar.",
        "",
    ),
];

static LOOKUP: LazyLock<HashMap<&'static str, [&'static str; 3]>> = LazyLock::new(|| {
    CATALOG
        .iter()
        .map(|(key, en, es, ar)| (*key, [*en, *es, *ar]))
        .collect()
});

/// Looks up display strings in the active language
#[derive(Debug, Clone, Copy, Default)]
pub struct Translator {
    language: Language,
}

impl Translator {
    pub fn new(language: Language) -> Self {
        Translator { language }
    }

    /// Build a translator from the stored language preference, falling back
    /// to `default_code` and then English.
    pub fn load<S: Store>(store: &S, default_code: &str) -> Result<Self, StoreError> {
        let language = store
            .get_value(Key::Language)?
            .and_then(|code| Language::from_code(&code))
            .or_else(|| Language::from_code(default_code))
            .unwrap_or_default();
        Ok(Translator { language })
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Active language → English → the key itself
    pub fn translate<'a>(&self, key: &'a str) -> &'a str {
        let Some(entry) = LOOKUP.get(key) else {
            return key;
        };
        let idx = match self.language {
            Language::En => 0,
            Language::Es => 1,
            Language::Ar => 2,
        };
        if !entry[idx].is_empty() {
            entry[idx]
        } else if !entry[0].is_empty() {
            entry[0]
        } else {
            key
        }
    }

    /// Translate `key` and substitute `{name}` placeholders in one pass
    /// over the template; substituted values are never rescanned.
    /// Unknown placeholders are left as written.
    pub fn format(&self, key: &str, args: &[(&str, &str)]) -> String {
        let template = self.translate(key);
        let mut out = String::with_capacity(template.len());
        let mut rest = template;
        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let value = after.find('}').and_then(|close| {
                let name = &after[..close];
                args.iter()
                    .find(|(n, _)| *n == name)
                    .map(|(_, v)| (*v, close))
            });
            match value {
                Some((v, close)) => {
                    out.push_str(v);
                    rest = &after[close + 1..];
                }
                None => {
                    out.push('{');
                    rest = after;
                }
            }
        }
        out.push_str(rest);
        out
    }
}

/// Persist the language preference
pub fn set_language<S: Store>(store: &mut S, language: Language) -> Result<(), StoreError> {
    store.set_value(Key::Language, Some(language.code()))?;
    tracing::info!(language = %language, "language changed");
    Ok(())
}
