use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Trade group a listing is filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    StructuralWork,
    CivilEngineering,
    Finishing,
    PlanningAndTechnology,
    OtherTrades,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::StructuralWork,
        Category::CivilEngineering,
        Category::Finishing,
        Category::PlanningAndTechnology,
        Category::OtherTrades,
    ];

    /// Label stored in documents and shown to users.
    pub fn label(self) -> &'static str {
        match self {
            Category::StructuralWork => "Hochbau",
            Category::CivilEngineering => "Tiefbau",
            Category::Finishing => "Ausbau",
            Category::PlanningAndTechnology => "Planung & Technik",
            Category::OtherTrades => "Weitere Berufe",
        }
    }

    /// Short key used in front-end URLs (`/berufe/hochbau`).
    pub fn slug(self) -> &'static str {
        match self {
            Category::StructuralWork => "hochbau",
            Category::CivilEngineering => "tiefbau",
            Category::Finishing => "ausbau",
            Category::PlanningAndTechnology => "planung",
            Category::OtherTrades => "weitere",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        let slug = slug.trim();
        Self::ALL
            .into_iter()
            .find(|category| category.slug().eq_ignore_ascii_case(slug))
    }

    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|category| category.label().to_lowercase() == label)
    }

    /// Accepts either the label (any case) or the URL slug.
    pub fn parse(raw: &str) -> Option<Self> {
        Self::from_label(raw).or_else(|| Self::from_slug(raw))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Category::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown category '{raw}'")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Occupation {
    pub id: &'static str,
    pub title: &'static str,
    pub category: Category,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub training: Option<&'static str>,
}

const fn occupation(
    id: &'static str,
    title: &'static str,
    category: Category,
    training: Option<&'static str>,
) -> Occupation {
    Occupation {
        id,
        title,
        category,
        training,
    }
}

use Category::{CivilEngineering, Finishing, OtherTrades, PlanningAndTechnology, StructuralWork};

const EFZ: Option<&str> = Some("EFZ");
const EBA: Option<&str> = Some("EBA");
const FH: Option<&str> = Some("FH");
const FH_ETH: Option<&str> = Some("FH/ETH");
const HFP: Option<&str> = Some("HFP");

pub static OCCUPATIONS: &[Occupation] = &[
    occupation("maurer", "Maurer/in EFZ", StructuralWork, EFZ),
    occupation("betonbauer", "Beton- und Stahlbetonbauer/in EFZ", StructuralWork, EFZ),
    occupation("trockenbauer", "Trockenbauer/in EFZ", StructuralWork, EFZ),
    occupation("zimmerer", "Zimmerer/Zimmermann/Zimmerin EFZ", StructuralWork, EFZ),
    occupation("maler", "Maler/in EFZ", StructuralWork, EFZ),
    occupation("fliesenleger", "Fliesenleger/in EFZ", StructuralWork, EFZ),
    occupation("natursteinbearbeiter", "Natursteinbearbeiter/in EFZ", StructuralWork, EFZ),
    occupation("bauhelfer-hochbau", "Bauhelfer/in Hochbau", StructuralWork, None),
    occupation("strassenbauer", "Strassenbauer/in EFZ", CivilEngineering, EFZ),
    occupation("tiefbaufacharbeiter", "Tiefbaufacharbeiter/in EBA", CivilEngineering, EBA),
    occupation("gleisbauer", "Gleisbauer/in EFZ", CivilEngineering, EFZ),
    occupation("grundbauer", "Grundbauer/in EFZ", CivilEngineering, EFZ),
    occupation("kanalbauer", "Kanalbauer/in EFZ", CivilEngineering, EFZ),
    occupation("bauhelfer-tiefbau", "Bauhelfer/in Tiefbau", CivilEngineering, None),
    occupation("schreiner", "Schreiner/in EFZ", Finishing, EFZ),
    occupation("elektroinstallateur", "Elektroinstallateur/in EFZ", Finishing, EFZ),
    occupation("heizungsinstallateur", "Heizungsinstallateur/in EFZ", Finishing, EFZ),
    occupation("sanitaerinstallateur", "Sanitärinstallateur/in EFZ", Finishing, EFZ),
    occupation("dachdecker", "Dachdecker/in EFZ", Finishing, EFZ),
    occupation("spengler", "Spengler/in EFZ", Finishing, EFZ),
    occupation("lueftungsinstallateur", "Lüftungsinstallateur/in EFZ", Finishing, EFZ),
    occupation("kaeltesystem-monteur", "Kältesystem-Monteur/in EFZ", Finishing, EFZ),
    occupation("plattenleger", "Plattenleger/in EFZ", Finishing, EFZ),
    occupation("bodenleger", "Bodenleger/in EFZ", Finishing, EFZ),
    occupation("anstreicher", "Anstreicher/in EFZ", Finishing, EFZ),
    occupation("gipser", "Gipser/in EFZ", Finishing, EFZ),
    occupation("architekt", "Architekt/in FH/ETH", PlanningAndTechnology, FH_ETH),
    occupation("bauingenieur", "Bauingenieur/in FH/ETH", PlanningAndTechnology, FH_ETH),
    occupation("bauzeichner", "Bauzeichner/in EFZ", PlanningAndTechnology, EFZ),
    occupation("geomatiker", "Geomatiker/in EFZ", PlanningAndTechnology, EFZ),
    occupation("vermessungstechniker", "Vermessungstechniker/in EFZ", PlanningAndTechnology, EFZ),
    occupation("bauleiter", "Bauleiter/in HFP", PlanningAndTechnology, HFP),
    occupation("bauoekonom", "Bauökonom/in FH", PlanningAndTechnology, FH),
    occupation("facility-manager", "Facility Manager/in FH", PlanningAndTechnology, FH),
    occupation("innenarchitekt", "Innenarchitekt/in FH", PlanningAndTechnology, FH),
    occupation("baumaschinenmechaniker", "Baumaschinenmechaniker/in EFZ", OtherTrades, EFZ),
    occupation("landschaftsgaertner", "Landschaftsgärtner/in EFZ", OtherTrades, EFZ),
    occupation("gartenbauer", "Gartenbauer/in EFZ", OtherTrades, EFZ),
    occupation("forstwart", "Forstwart/in EFZ", OtherTrades, EFZ),
    occupation("metallbauer", "Metallbauer/in EFZ", OtherTrades, EFZ),
    occupation("schlossereimechaniker", "Schlossereimechaniker/in EFZ", OtherTrades, EFZ),
    occupation("baufuehrer", "Bauführer/in", OtherTrades, None),
    occupation("polier", "Polier/in", OtherTrades, None),
    occupation("bauvorarbeiter", "Bauvorarbeiter/in", OtherTrades, None),
    occupation("kranfuehrer", "Kranführer/in", OtherTrades, None),
    occupation("betontrennfachmann", "Betontrennfachmann/-frau", OtherTrades, None),
    occupation("sprengfachmann", "Sprengfachmann/-frau", OtherTrades, None),
    occupation("fassadenbauer", "Fassadenbauer/in EFZ", OtherTrades, EFZ),
    occupation("holzbau-polier", "Holzbau-Polier/in HFP", OtherTrades, HFP),
    occupation("beton-polier", "Beton- und Stahlbetonbau-Polier/in HFP", OtherTrades, HFP),
    occupation("strassenbau-polier", "Strassenbau-Polier/in HFP", OtherTrades, HFP),
    occupation("tiefbau-polier", "Tiefbau-Polier/in HFP", OtherTrades, HFP),
    occupation("bauwerktrenner", "Bauwerktrenner/in", OtherTrades, None),
    occupation("denkmalpfleger", "Denkmalpfleger/in", OtherTrades, None),
    occupation("bauadministrationsfachmann", "Bauadministrationsfachmann/-frau", OtherTrades, None),
    occupation("bauoekonom-verwaltung", "Bauökonom/in", OtherTrades, None),
    occupation("baukostenplaner", "Baukostenplaner/in FH", OtherTrades, FH),
    occupation("bausachverstaendiger", "Bausachverständige/r", OtherTrades, None),
];

pub fn by_id(id: &str) -> Option<&'static Occupation> {
    OCCUPATIONS.iter().find(|occupation| occupation.id == id)
}

pub fn by_title(title: &str) -> Option<&'static Occupation> {
    let title = title.trim();
    OCCUPATIONS.iter().find(|occupation| occupation.title == title)
}

/// First occupation (in catalog order) whose title appears inside `text`, ignoring case.
pub fn mentioned_in(text: &str) -> Option<&'static Occupation> {
    let haystack = text.to_lowercase();
    OCCUPATIONS
        .iter()
        .find(|occupation| haystack.contains(&occupation.title.to_lowercase()))
}

pub fn in_category(category: Category) -> impl Iterator<Item = &'static Occupation> {
    OCCUPATIONS
        .iter()
        .filter(move |occupation| occupation.category == category)
}
