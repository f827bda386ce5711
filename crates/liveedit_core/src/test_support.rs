//! Shared test-only helpers for liveedit_core.

use crate::actions::EditTarget;
use tempfile::TempDir;

pub(crate) const HERO_PAGE: &str = r#"import EditableText from '@/components/EditableText';

const HERO_TEXT = /* HERO_TEXT_START */ "Research peptides, verified." /* HERO_TEXT_END */;

export default function Home() {
  return <EditableText tagName="h1" content={HERO_TEXT} />;
}
"#;

pub(crate) const MISSION_SECTION: &str = r#"export const CARD_POSITIONS = [
  /* CARD_1_START */ { x: 0, y: 0 } /* CARD_1_END */,
  /* CARD_2_START */ { x: 0, y: 0 } /* CARD_2_END */,
  /* CARD_3_START */ { x: 0, y: 0 } /* CARD_3_END */,
];

export const MISSION_VIAL = /* VIAL_START */ { x: 0, y: 0, rotate: 0, scale: 1 } /* VIAL_END */;
"#;

pub(crate) const MEDICAL_CORE: &str = r#"const initialVial = /* VIAL_POS_START */ { x: 0, y: 0, rotate: 0, scale: 1.00 } /* VIAL_POS_END */;

export default function MedicalCore() {
  return <Vial initial={initialVial} />;
}
"#;

/// Creates a temporary project tree holding the three editable documents.
///
/// Keep the [`TempDir`] alive for the full test to preserve the files.
///
/// # Panics
/// Panics if the temp dir or any seed file cannot be created.
pub(crate) fn seed_project() -> TempDir {
    let dir = TempDir::new().expect("temp dir");
    for (target, text) in [
        (EditTarget::Hero, HERO_PAGE),
        (EditTarget::Mission, MISSION_SECTION),
        (EditTarget::Vial, MEDICAL_CORE),
    ] {
        let path = dir.path().join(target.path());
        let parent = path.parent().expect("document parent");
        std::fs::create_dir_all(parent).expect("create document dir");
        std::fs::write(&path, text).expect("seed document");
    }
    dir
}

/// Reads a target document back from a seeded project.
///
/// # Panics
/// Panics if the document cannot be read.
pub(crate) fn read_document(project: &TempDir, target: EditTarget) -> String {
    std::fs::read_to_string(project.path().join(target.path())).expect("read document")
}
