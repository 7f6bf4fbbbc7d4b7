//! Built-in pictograms shipped with the application.
//!
//! Asset ids are paths relative to the configured assets directory
//! (`AppConfig::assets_dir`). The declaration order here is the order the
//! board shows them in.

use crate::models::{AssetId, AssetRef, Category, Pictogram};

/// A pictogram compiled into the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuiltInAsset {
    pub name: &'static str,
    pub image: AssetId,
    pub sound: AssetId,
    pub category: Category,
}

impl BuiltInAsset {
    const fn new(name: &'static str, image: &'static str, sound: &'static str, category: Category) -> Self {
        Self {
            name,
            image: AssetId(image),
            sound: AssetId(sound),
            category,
        }
    }

    pub fn to_pictogram(&self) -> Pictogram {
        Pictogram::new(
            self.name,
            AssetRef::BuiltIn(self.image),
            AssetRef::BuiltIn(self.sound),
            self.category,
        )
    }
}

pub const BUILT_IN: [BuiltInAsset; 15] = [
    BuiltInAsset::new("Sí", "images/si.jpg", "sounds/si.mp3", Category::RespuestasRapidas),
    BuiltInAsset::new("No", "images/no.jpg", "sounds/no.mp3", Category::RespuestasRapidas),
    BuiltInAsset::new("Comer", "images/comer.jpg", "sounds/comer.mp3", Category::Acciones),
    BuiltInAsset::new("Papá", "images/papa.jpg", "sounds/papa.mp3", Category::RespuestasRapidas),
    BuiltInAsset::new("Mamá", "images/mama1.jpg", "sounds/mama.mp3", Category::RespuestasRapidas),
    BuiltInAsset::new("Saludar", "images/saludar.jpg", "sounds/saludo.mp3", Category::Acciones),
    BuiltInAsset::new("Feliz", "images/feliz.png", "sounds/feliz.mp3", Category::Emociones),
    BuiltInAsset::new("Triste", "images/triste.png", "sounds/triste.mp3", Category::Emociones),
    BuiltInAsset::new("Sed", "images/sed.png", "sounds/sed.mp3", Category::RespuestasRapidas),
    BuiltInAsset::new("Baño", "images/bano.png", "sounds/bano.mp3", Category::RespuestasRapidas),
    BuiltInAsset::new("Dolor", "images/dolor.png", "sounds/dolor.mp3", Category::Emociones),
    BuiltInAsset::new("Jugar", "images/jugar.png", "sounds/jugar.mp3", Category::Acciones),
    BuiltInAsset::new("Pintar", "images/pintar.png", "sounds/pintar.mp3", Category::Acciones),
    BuiltInAsset::new("Musica", "images/musica.png", "sounds/musica.mp3", Category::Acciones),
    BuiltInAsset::new("Abrazo", "images/abrazo.png", "sounds/abrazo.mp3", Category::Emociones),
];

/// Built-in pictograms in declaration order
pub fn builtin_pictograms() -> Vec<Pictogram> {
    BUILT_IN.iter().map(BuiltInAsset::to_pictogram).collect()
}

/// Exact, case-sensitive membership test used for delete protection
pub fn is_builtin_name(name: &str) -> bool {
    BUILT_IN.iter().any(|asset| asset.name == name)
}

/// Case-insensitive match used when checking new names for collisions
pub fn find_by_name_ignore_case(name: &str) -> Option<&'static BuiltInAsset> {
    let needle = name.trim().to_lowercase();
    BUILT_IN.iter().find(|asset| asset.name.to_lowercase() == needle)
}

/// Whether an asset id names a file bundled with the catalog
pub fn contains_asset(id: &str) -> bool {
    BUILT_IN
        .iter()
        .any(|asset| asset.image.as_str() == id || asset.sound.as_str() == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_names_are_unique() {
        let names: HashSet<_> = BUILT_IN.iter().map(|a| a.name).collect();
        assert_eq!(names.len(), BUILT_IN.len());
    }

    #[test]
    fn test_catalog_uses_concrete_categories() {
        for asset in BUILT_IN.iter() {
            assert!(!asset.category.is_filter_only(), "{} uses a filter category", asset.name);
            assert_ne!(asset.category, Category::Personalizados);
        }
    }

    #[test]
    fn test_builtin_pictograms_keep_declaration_order() {
        let pictograms = builtin_pictograms();
        assert_eq!(pictograms.len(), 15);
        assert_eq!(pictograms[0].name, "Sí");
        assert_eq!(pictograms[14].name, "Abrazo");
        assert!(pictograms.iter().all(|p| p.image.is_builtin() && p.audio.is_builtin()));
    }

    #[test]
    fn test_name_lookup() {
        assert!(is_builtin_name("Mamá"));
        assert!(!is_builtin_name("mamá"));
        assert!(find_by_name_ignore_case("mamá").is_some());
        assert!(find_by_name_ignore_case("Hola").is_none());
    }

    #[test]
    fn test_contains_asset() {
        assert!(contains_asset("sounds/saludo.mp3"));
        assert!(contains_asset("images/mama1.jpg"));
        assert!(!contains_asset("sounds/hola.m4a"));
    }
}
