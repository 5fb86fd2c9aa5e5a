//! Process-wide error message catalog.
//!
//! Built once on first use and never mutated afterwards.

use std::collections::HashMap;
use std::sync::LazyLock;

use tracing::{debug, trace};

use crate::error::ErrorKind;

/// Language used when a requested translation is missing.
pub const DEFAULT_LANGUAGE: &str = "en-US";

type Catalog = HashMap<&'static str, [&'static str; 6]>;

static CATALOG: LazyLock<Catalog> = LazyLock::new(|| {
    let mut catalog = Catalog::new();
    catalog.insert(
        "en-US",
        [
            "Unknown enum value.",
            "Connection closed.",
            "Invalid argument.",
            "Argument out of range.",
            "Buffer too small.",
            "State change rejected.",
        ],
    );
    catalog.insert(
        "de",
        [
            "Unbekannter Enum-Wert.",
            "Verbindung geschlossen.",
            "Ungültiges Argument.",
            "Argument außerhalb des gültigen Bereichs.",
            "Puffer zu klein.",
            "Zustandsänderung abgelehnt.",
        ],
    );
    catalog.insert(
        "fi",
        [
            "Tuntematon enum-arvo.",
            "Yhteys on suljettu.",
            "Virheellinen argumentti.",
            "Argumentti on sallitun alueen ulkopuolella.",
            "Puskuri on liian pieni.",
            "Tilan muutos hylättiin.",
        ],
    );
    catalog.insert(
        "sv",
        [
            "Okänt enum-värde.",
            "Anslutningen är stängd.",
            "Ogiltigt argument.",
            "Argumentet är utanför giltigt intervall.",
            "Bufferten är för liten.",
            "Tillståndsändringen avvisades.",
        ],
    );
    catalog.insert(
        "es",
        [
            "Valor de enumeración desconocido.",
            "Conexión cerrada.",
            "Argumento no válido.",
            "Argumento fuera de rango.",
            "El búfer es demasiado pequeño.",
            "Cambio de estado rechazado.",
        ],
    );
    catalog.insert(
        "et",
        [
            "Tundmatu enum-väärtus.",
            "Ühendus suletud.",
            "Vigane argument.",
            "Argument väljaspool lubatud vahemikku.",
            "Puhver on liiga väike.",
            "Oleku muutus lükati tagasi.",
        ],
    );
    catalog
});

/// Look up the message for `kind` in `language`.
///
/// Matching is case-insensitive. `de-AT` falls back to `de`, and anything
/// without a translation falls back to [`DEFAULT_LANGUAGE`].
pub fn message(kind: ErrorKind, language: &str) -> &'static str {
    let index = ErrorKind::ALL
        .iter()
        .position(|k| *k == kind)
        .unwrap_or_default();
    CATALOG
        .get(resolve_language(language))
        .map(|row| row[index])
        .unwrap_or("")
}

/// Catalog tag used for messages in `language`.
pub fn resolve_language(language: &str) -> &'static str {
    if let Some(tag) = lookup(language) {
        return tag;
    }
    if let Some(tag) = lookup(primary_subtag(language)) {
        trace!(language, tag, "using primary language translation");
        return tag;
    }
    debug!(language, "no translation, using {DEFAULT_LANGUAGE}");
    DEFAULT_LANGUAGE
}

/// Language tags with a translation.
pub fn supported_languages() -> Vec<&'static str> {
    let mut tags: Vec<_> = CATALOG.keys().copied().collect();
    tags.sort_unstable();
    tags
}

fn lookup(language: &str) -> Option<&'static str> {
    CATALOG
        .keys()
        .find(|tag| tag.eq_ignore_ascii_case(language))
        .copied()
}

fn primary_subtag(language: &str) -> &str {
    language.split(['-', '_']).next().unwrap_or(language)
}
