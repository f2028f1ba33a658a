use crate::Item;

pub const SYNTHETIC_COUNT: usize = 150;

/// Parses the delimited item list: one item per non-blank line, quotes
/// removed, everything from the first comma on discarded.
pub fn parse_items(text: &str) -> Vec<Item> {
    text.split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .enumerate()
        .map(|(idx, line)| Item::new(idx as u32 + 1, first_field(line)))
        .collect()
}

fn first_field(line: &str) -> String {
    let unquoted = line.replace('"', "");
    match unquoted.find(',') {
        Some(pos) => unquoted[..pos].to_string(),
        None => unquoted,
    }
}

pub fn synthetic_items(count: usize) -> Vec<Item> {
    (1..=count)
        .map(|n| Item::new(n as u32, format!("Item {n}")))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_comma_suffix() {
        assert_eq!(
            parse_items("X,foo\nY,bar"),
            vec![Item::new(1, "X"), Item::new(2, "Y")]
        );
    }

    #[test]
    fn skips_blank_lines_and_quotes() {
        let items = parse_items("\"Alice\"\r\n\n   \n \"Bob\",\"x,y\"\r\nCarol");
        assert_eq!(
            items,
            vec![Item::new(1, "Alice"), Item::new(2, "Bob"), Item::new(3, "Carol")]
        );
    }

    #[test]
    fn keeps_duplicate_labels_with_distinct_ids() {
        let items = parse_items("A\nA");
        assert_eq!(items, vec![Item::new(1, "A"), Item::new(2, "A")]);
    }

    #[test]
    fn synthetic_sequence() {
        let items = synthetic_items(SYNTHETIC_COUNT);
        assert_eq!(items.len(), 150);
        assert_eq!(items[0], Item::new(1, "Item 1"));
        assert_eq!(items[149], Item::new(150, "Item 150"));
    }
}
