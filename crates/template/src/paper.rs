/// Paper id meaning "explicit width and height follow".
pub const PAPER_ID_OTHER: &str = "Other";

/// Named paper size, dimensions in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Paper {
    pub id: &'static str,
    pub name: &'static str,
    pub width: f64,
    pub height: f64,
}

const MM: f64 = 72.0 / 25.4;

pub static PAPERS: [Paper; 5] = [
    Paper {
        id: "US-Letter",
        name: "US Letter",
        width: 612.0,
        height: 792.0,
    },
    Paper {
        id: "US-Legal",
        name: "US Legal",
        width: 612.0,
        height: 1008.0,
    },
    Paper {
        id: "A4",
        name: "A4",
        width: 210.0 * MM,
        height: 297.0 * MM,
    },
    Paper {
        id: "A5",
        name: "A5",
        width: 148.0 * MM,
        height: 210.0 * MM,
    },
    Paper {
        id: "A3",
        name: "A3",
        width: 297.0 * MM,
        height: 420.0 * MM,
    },
];

/// Finds a paper by id, falling back to its display name.
pub fn find_paper(id_or_name: &str) -> Option<&'static Paper> {
    PAPERS
        .iter()
        .find(|paper| paper.id == id_or_name)
        .or_else(|| PAPERS.iter().find(|paper| paper.name == id_or_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_id_or_name() {
        assert_eq!(find_paper("US-Letter").map(|p| p.height), Some(792.0));
        assert_eq!(find_paper("US Legal").map(|p| p.id), Some("US-Legal"));
        assert!(find_paper(PAPER_ID_OTHER).is_none());
    }
}
