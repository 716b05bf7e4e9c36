//! Built-in vocabulary tables.
//!
//! Every entry is the literal display string written into prompt text. Categories that
//! wrap their value (`inspired by X`, `created in X`, `X Aesthetic`) store the bare value
//! here; the wrapping lives in [`ValueTemplate`].

use serde::{Deserialize, Serialize};

/// Trailing directive every finalized prompt ends with.
pub const DIRECTIVE_SUFFIX: &str = "--ar 16:9 --style raw";

/// Leading token of the photography grammar.
pub const CINEMATIC_LEADING_TOKEN: &str = "Cinematic";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueTemplate {
    #[default]
    Bare,
    InspiredBy,
    CreatedIn,
    Aesthetic,
}

impl ValueTemplate {
    pub fn apply(self, value: &str) -> String {
        let value = value.trim();
        match self {
            Self::Bare => value.to_owned(),
            Self::InspiredBy => format!("inspired by {value}"),
            Self::CreatedIn => format!("created in {value}"),
            Self::Aesthetic => format!("{value} Aesthetic"),
        }
    }

    /// Normalized marker whose presence in a clause signals this template.
    pub fn keyword(self) -> Option<&'static str> {
        match self {
            Self::Bare => None,
            Self::InspiredBy => Some("inspiredby"),
            Self::CreatedIn => Some("createdin"),
            Self::Aesthetic => Some("aesthetic"),
        }
    }

    /// True when `value` already reads as a templated clause.
    pub fn is_applied(self, value: &str) -> bool {
        let lowered = value.trim().to_lowercase();
        match self {
            Self::Bare => true,
            Self::InspiredBy => lowered.starts_with("inspired by "),
            Self::CreatedIn => lowered.starts_with("created in "),
            Self::Aesthetic => lowered.ends_with(" aesthetic"),
        }
    }

    /// Applies the template unless the value already carries it.
    pub fn format(self, value: &str) -> String {
        if self.is_applied(value) {
            value.trim().to_owned()
        } else {
            self.apply(value)
        }
    }
}

pub const ILLUSTRATION_TYPES: &[&str] = &[
    "Realistic Illustration",
    "Cartoon Illustration",
    "Minimalist Illustration",
    "Flat Illustration",
    "Line Art",
    "Watercolor Illustration",
    "Digital Painting",
    "Vector Illustration",
    "Isometric Illustration",
    "Fantasy Illustration",
    "Retro Illustration",
    "Vintage Illustration",
    "Concept Art",
    "Infographic Illustration",
    "Character Design",
    "Children's Book Illustration",
    "Traditional (Hand-Drawn) Illustration",
    "Digital Illustration",
    "Pencil Illustration",
    "Ink Illustration",
    "Caricature Illustration",
    "Comic Book Illustration",
    "Surreal Illustration",
    "Fashion Illustration",
    "Pattern Illustration",
    "Architectural Illustration",
    "Botanical Illustration",
    // animation
    "Traditional (Hand-Drawn) Animation",
    "2D Animation",
    "3D Animation (CGI)",
    "Stop Motion Animation",
    "Motion Graphics",
    "Whiteboard Animation",
    "Cutout Animation",
    "Claymation (Clay Animation)",
    "Puppet Animation",
    "Rotoscoping",
    "Kinetic Typography",
    "Experimental Animation",
    "Augmented Reality (AR) Animation",
    "Virtual Reality (VR) Animation",
    "Pixel Art Animation",
    "Flipbook Animation",
    "Anime",
    "Morphing Animation",
    "Sand Animation",
];

pub const ILLUSTRATION_SHOT_TYPES: &[&str] = &[
    "Extreme Close-Up",
    "Close-Up",
    "Medium Close-Up",
    "Medium Shot",
    "Medium Full Shot",
    "Full Shot",
    "Long Shot",
    "Extreme Long Shot",
    "Wide Shot",
];

pub const ILLUSTRATION_CAMERA_ANGLES: &[&str] = &[
    "Eye Level",
    "High Angle",
    "Low Angle",
    "Dutch Angle",
    "Bird's Eye View",
    "Worm's Eye View",
    "Side View",
];

pub const ILLUSTRATION_STYLES: &[&str] = &[
    "Disney",
    "Pixar",
    "Studio Ghibli",
    "Hayao Miyazaki",
    "Isao Takahata",
    "John Burningham",
    "Beatrix Potter",
    "Winsor McCay",
    "Walt Disney",
];

pub const RENDERING_ENGINES: &[&str] = &[
    "Blender",
    "Maya",
    "Unreal Engine",
    "Unity",
    "Toon Boom Harmony",
    "Procreate",
    "Adobe Animate",
    "Cinema 4D",
];

pub const ILLUSTRATION_AESTHETICS: &[&str] = &[
    "Classic Disney Animation",
    "Modern Anime",
    "Pixar 3D Animation",
    "Studio Ghibli",
    "Vintage Hand-Drawn",
    "Minimalist Animation",
    "Watercolor Illustration",
    "Digital Art",
    "Comic Book",
    "Children's Book Illustration",
    "Vector Art",
    "Concept Art",
    "Traditional Animation",
    "Stop Motion",
    "Experimental Animation",
    "Fantasy Art",
    "Surreal Art",
    "Retro Animation",
    "Claymation",
    "Cartoon Network",
];

pub const PHOTOGRAPHY_GENRES: &[&str] = &[
    "Abstract Photography",
    "Action Photography",
    "Adventure Photography",
    "Aerial Photography",
    "Architectural Photography",
    "Astrophotography",
    "Candid Photography",
    "Car Photography",
    "Celebrity Portraiture",
    "Concert Photography",
    "Conceptual Photography",
    "Corporate Photography",
    "Cyberpunk Photography",
    "Documentary Photography",
    "Editorial Photography",
    "Environmental Photography",
    "Environmental Portraiture",
    "Experimental Photography",
    "Fantasy Photography",
    "Fashion Editorials",
    "Fashion Photography",
    "Fashion Portraits",
    "Film Still Photography",
    "Fine Art Photography",
    "Food Photography",
    "Forensic Photography",
    "Gothic Photography",
    "Historical Photography",
    "Horror Photography",
    "Industrial Photography",
    "Infrared Photography",
    "Interior Design Photography",
    "Landscape Photography",
    "Lifestyle Photography",
    "Light Painting",
    "Macro Photography",
    "Medical Photography",
    "Minimalist Photography",
    "Multiple Exposure Photography",
    "Motorsport Photography",
    "Noir Photography",
    "Pinhole Photography",
    "Product Photography",
    "Real Estate Photography",
    "SciFi Photography",
    "Social Documentary Photography",
    "Sports Photography",
    "Street & Urban Photography",
    "Street Photography",
    "Surreal Photography",
    "Traditional Portrait Photography",
    "Travel Photography",
    "Underwater Photography",
    "War Photography",
    "Wedding Photography",
    "Western Photography",
    "Wildlife Photography",
];

pub const PHOTOGRAPHY_SHOT_TYPES: &[&str] = &[
    "Extreme Close-Up",
    "Close-Up",
    "Medium Close-Up",
    "Medium Shot",
    "Medium Long Shot",
    "Medium Full Shot",
    "Full Shot",
    "Long Shot",
    "Extreme Long Shot",
    "Wide Shot",
    "Extreme Wide Shot",
    "Establishing Shot",
    "Two Shot",
    "Over-the-Shoulder Shot",
    "Point-of-View Shot",
    "Aerial Shot",
    "Tracking Shot",
    "Dolly Shot",
    "Master Shot",
    "Macro Shot",
];

pub const PHOTOGRAPHY_CAMERA_ANGLES: &[&str] = &[
    "Eye Level",
    "High Angle",
    "Low Angle",
    "Extreme High Angle",
    "Extreme Low Angle",
    "Dutch Angle",
    "Bird's Eye View",
    "Worm's Eye View",
    "Overhead Angle",
    "Ground Level",
    "Shoulder Level",
    "Hip Level",
    "Knee Level",
    "Side Angle",
    "Oblique Angle",
    "Canted Angle",
];

pub const CINEMATOGRAPHERS_AND_DIRECTORS: &[&str] = &[
    "Vittorio Storaro",
    "Roger Deakins",
    "Emmanuel Lubezki",
    "Bradford Young",
    "Rachel Morrison",
    "Hoyte van Hoytema",
    "Robert Richardson",
    "Janusz Kamiński",
    "Christopher Doyle",
    "Darius Khondji",
    "Sven Nykvist",
    "Gordon Willis",
    "Greig Fraser",
    "Matthew Libatique",
    "Rodrigo Prieto",
    "Stanley Kubrick",
    "Christopher Nolan",
    "Wes Anderson",
    "Martin Scorsese",
    "Quentin Tarantino",
    "David Fincher",
    "Steven Spielberg",
    "Wong Kar-wai",
    "Terrence Malick",
    "Paul Thomas Anderson",
    "Denis Villeneuve",
    "Alfonso Cuarón",
    "Alejandro González Iñárritu",
    "Ridley Scott",
    "Ang Lee",
];

pub const FILM_STOCKS: &[&str] = &[
    "Kodak Vision3 50D",
    "Kodak Vision3 200T",
    "Kodak Vision3 250D",
    "Kodak Vision3 500T",
    "Kodak Vision3 800T",
    "Kodak Vision2 100T",
    "Kodak Vision2 200T",
    "Kodak Vision2 250D",
    "Kodak Vision2 500T",
    "Kodak Portra 160",
    "Kodak Portra 400",
    "Kodak Portra 800",
    "Kodak Ektar 100",
    "Kodak Ektachrome",
    "Kodak Double X",
    "Kodak Plus-X",
    "Kodak Tri-X",
    "Kodak T-Max 400",
    "Fujifilm Eterna 100T",
    "Fujifilm Eterna 200D",
    "Fujifilm Eterna 500T",
    "Fujifilm Pro 400H",
    "Fujifilm Superia XTRA 400",
    "Fujifilm Velvia 50",
    "Fujifilm Velvia 100",
    "Fujifilm Neopan 100 Acros",
    "Ilford Delta 3200",
    "Ilford Delta 100",
    "Ilford Delta 400",
    "Ilford HP5 Plus",
    "Ilford FP4 Plus",
    "Cinestill 800T",
    "Cinestill 50D",
    "Agfa Scala 200x II",
    "Konica Century 50D",
];

pub const FILM_STOCK_BRANDS: &[&str] = &["kodak", "fujifilm", "fuji", "ilford", "cinestill", "agfa"];

pub const PHOTOGRAPHY_AESTHETICS: &[&str] = &[
    "Hyper-Realistic",
    "Naturalistic",
    "Documentary",
    "Soft Focus",
    "High-Contrast",
    "Film-Look",
    "Cinematic Realism",
    "Studio Photography",
    "Editorial",
    "Lifestyle",
    "Vintage Film",
    "Desaturated Gritty",
    "Dreamlike Soft Light",
    "Film Noir",
    "Black and White",
    "High Key",
    "Low Key",
    "Minimalist",
    "Baroque Painting",
    "Renaissance",
    "Neon Noir",
    "Cyberpunk",
];

/// Lens descriptions never count as a parameter in photography prompts.
pub const LENS_PATTERNS: &[&str] = &[
    r"(?i)\b\d{1,4}\s?mm\b",
    r"(?i)\blens(es)?\b",
    r"(?i)\b(prime|anamorphic|telephoto|fish-?eye|tilt-shift)\b",
    r"(?i)\bf/\d",
];
