//! Address extraction from text without block geometry.

use super::patterns::{is_country_line, is_postal_line};

/// Extract the address from flat OCR text.
///
/// Keeps every line from the top through the last postal-code line (plus a
/// following "FRANCE"). Without a postal line the whole text is returned, on
/// the assumption that the capture region was aimed at the address.
pub fn extract_from_text(text: &str) -> Option<String> {
    let lines: Vec<&str> = text
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect();

    let anchor = lines.iter().rposition(|l| is_postal_line(l));

    match anchor {
        Some(index) => {
            let end = match lines.get(index + 1) {
                Some(next) if is_country_line(next) => index + 1,
                _ => index,
            };
            Some(lines[..=end].join("\n"))
        }
        None => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anchor_with_country() {
        let text = "MME DUPONT\n12 RUE DE PARIS\n75001 PARIS\nFRANCE\nSD : 869 123";
        assert_eq!(
            extract_from_text(text).as_deref(),
            Some("MME DUPONT\n12 RUE DE PARIS\n75001 PARIS\nFRANCE")
        );
    }

    #[test]
    fn test_last_anchor_wins() {
        let text = "LA POSTE\n33000 BORDEAUX\n\n  M. MARTIN \n4 AVENUE FOCH\n69002 LYON\nAVIS";
        assert_eq!(
            extract_from_text(text).as_deref(),
            Some("LA POSTE\n33000 BORDEAUX\nM. MARTIN\n4 AVENUE FOCH\n69002 LYON")
        );
    }

    #[test]
    fn test_no_anchor_returns_whole_text() {
        assert_eq!(
            extract_from_text("  MME DUPONT\n12 RUE  ").as_deref(),
            Some("MME DUPONT\n12 RUE")
        );
        assert_eq!(extract_from_text(" \n "), None);
    }
}
