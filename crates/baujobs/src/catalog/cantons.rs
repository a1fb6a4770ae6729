use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Canton {
    pub code: &'static str,
    pub name: &'static str,
}

pub static CANTONS: &[Canton] = &[
    Canton { code: "ZH", name: "Zürich" },
    Canton { code: "BE", name: "Bern" },
    Canton { code: "LU", name: "Luzern" },
    Canton { code: "UR", name: "Uri" },
    Canton { code: "SZ", name: "Schwyz" },
    Canton { code: "OW", name: "Obwalden" },
    Canton { code: "NW", name: "Nidwalden" },
    Canton { code: "GL", name: "Glarus" },
    Canton { code: "ZG", name: "Zug" },
    Canton { code: "FR", name: "Freiburg" },
    Canton { code: "SO", name: "Solothurn" },
    Canton { code: "BS", name: "Basel-Stadt" },
    Canton { code: "BL", name: "Basel-Landschaft" },
    Canton { code: "SH", name: "Schaffhausen" },
    Canton { code: "AR", name: "Appenzell Ausserrhoden" },
    Canton { code: "AI", name: "Appenzell Innerrhoden" },
    Canton { code: "SG", name: "St. Gallen" },
    Canton { code: "GR", name: "Graubünden" },
    Canton { code: "AG", name: "Aargau" },
    Canton { code: "TG", name: "Thurgau" },
    Canton { code: "TI", name: "Tessin" },
    Canton { code: "VD", name: "Waadt" },
    Canton { code: "VS", name: "Wallis" },
    Canton { code: "NE", name: "Neuenburg" },
    Canton { code: "GE", name: "Genf" },
    Canton { code: "JU", name: "Jura" },
];

/// Locality name paired with the code of its canton.
pub static LOCALITIES: &[(&str, &str)] = &[
    ("Zürich", "ZH"),
    ("Winterthur", "ZH"),
    ("Uster", "ZH"),
    ("Dübendorf", "ZH"),
    ("Dietikon", "ZH"),
    ("Wetzikon", "ZH"),
    ("Kloten", "ZH"),
    ("Horgen", "ZH"),
    ("Bülach", "ZH"),
    ("Bern", "BE"),
    ("Biel/Bienne", "BE"),
    ("Thun", "BE"),
    ("Köniz", "BE"),
    ("Burgdorf", "BE"),
    ("Langenthal", "BE"),
    ("Interlaken", "BE"),
    ("Luzern", "LU"),
    ("Emmen", "LU"),
    ("Kriens", "LU"),
    ("Horw", "LU"),
    ("Sursee", "LU"),
    ("Altdorf", "UR"),
    ("Erstfeld", "UR"),
    ("Andermatt", "UR"),
    ("Schwyz", "SZ"),
    ("Einsiedeln", "SZ"),
    ("Freienbach", "SZ"),
    ("Küssnacht", "SZ"),
    ("Lachen", "SZ"),
    ("Sarnen", "OW"),
    ("Kerns", "OW"),
    ("Engelberg", "OW"),
    ("Stans", "NW"),
    ("Hergiswil", "NW"),
    ("Buochs", "NW"),
    ("Glarus", "GL"),
    ("Näfels", "GL"),
    ("Schwanden", "GL"),
    ("Zug", "ZG"),
    ("Baar", "ZG"),
    ("Cham", "ZG"),
    ("Steinhausen", "ZG"),
    ("Freiburg", "FR"),
    ("Bulle", "FR"),
    ("Murten", "FR"),
    ("Düdingen", "FR"),
    ("Solothurn", "SO"),
    ("Olten", "SO"),
    ("Grenchen", "SO"),
    ("Zuchwil", "SO"),
    ("Basel", "BS"),
    ("Riehen", "BS"),
    ("Bettingen", "BS"),
    ("Liestal", "BL"),
    ("Allschwil", "BL"),
    ("Reinach", "BL"),
    ("Muttenz", "BL"),
    ("Pratteln", "BL"),
    ("Schaffhausen", "SH"),
    ("Neuhausen am Rheinfall", "SH"),
    ("Thayngen", "SH"),
    ("Herisau", "AR"),
    ("Teufen", "AR"),
    ("Heiden", "AR"),
    ("Appenzell", "AI"),
    ("Oberegg", "AI"),
    ("St. Gallen", "SG"),
    ("Rapperswil-Jona", "SG"),
    ("Wil", "SG"),
    ("Gossau", "SG"),
    ("Buchs", "SG"),
    ("Chur", "GR"),
    ("Davos", "GR"),
    ("St. Moritz", "GR"),
    ("Landquart", "GR"),
    ("Ilanz", "GR"),
    ("Aarau", "AG"),
    ("Baden", "AG"),
    ("Wettingen", "AG"),
    ("Brugg", "AG"),
    ("Wohlen", "AG"),
    ("Lenzburg", "AG"),
    ("Frauenfeld", "TG"),
    ("Kreuzlingen", "TG"),
    ("Arbon", "TG"),
    ("Weinfelden", "TG"),
    ("Lugano", "TI"),
    ("Bellinzona", "TI"),
    ("Locarno", "TI"),
    ("Mendrisio", "TI"),
    ("Lausanne", "VD"),
    ("Yverdon-les-Bains", "VD"),
    ("Montreux", "VD"),
    ("Nyon", "VD"),
    ("Vevey", "VD"),
    ("Sion", "VS"),
    ("Visp", "VS"),
    ("Brig-Glis", "VS"),
    ("Martigny", "VS"),
    ("Monthey", "VS"),
    ("Neuchâtel", "NE"),
    ("La Chaux-de-Fonds", "NE"),
    ("Le Locle", "NE"),
    ("Genève", "GE"),
    ("Carouge", "GE"),
    ("Vernier", "GE"),
    ("Lancy", "GE"),
    ("Delémont", "JU"),
    ("Porrentruy", "JU"),
    ("Saignelégier", "JU"),
];

pub fn by_code(code: &str) -> Option<&'static Canton> {
    let code = code.trim();
    CANTONS
        .iter()
        .find(|canton| canton.code.eq_ignore_ascii_case(code))
}

pub fn canton_of(locality: &str) -> Option<&'static Canton> {
    LOCALITIES
        .iter()
        .find(|(name, _)| *name == locality)
        .and_then(|(_, code)| by_code(code))
}

/// Every locality of a canton, in table order. Unknown codes yield an empty list.
pub fn localities_in(code: &str) -> Vec<&'static str> {
    let Some(canton) = by_code(code) else {
        return Vec::new();
    };
    LOCALITIES
        .iter()
        .filter(|(_, owner)| *owner == canton.code)
        .map(|(name, _)| *name)
        .collect()
}

pub fn search_localities(query: &str, limit: usize) -> Vec<&'static str> {
    let needle = query.trim().to_lowercase();
    LOCALITIES
        .iter()
        .map(|(name, _)| *name)
        .filter(|name| name.to_lowercase().contains(&needle))
        .take(limit)
        .collect()
}
