/// Entries per page, for every paged view.
pub const PAGE_SIZE: u32 = 9;

pub fn page_count(total_count: u32, page_size: u32) -> u32 {
    if page_size == 0 {
        return 0;
    }
    total_count.div_ceil(page_size)
}

/// Whether a page exists after `current_page`.
pub fn can_advance(current_page: u32, total_count: u32, page_size: u32) -> bool {
    page_count(total_count, page_size) > current_page + 1
}

pub fn can_retreat(current_page: u32) -> bool {
    current_page > 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exactly_one_full_page() {
        assert_eq!(page_count(9, PAGE_SIZE), 1);
        assert!(!can_advance(0, 9, PAGE_SIZE));
    }

    #[test]
    fn one_entry_spills_onto_second_page() {
        assert_eq!(page_count(10, PAGE_SIZE), 2);
        assert!(can_advance(0, 10, PAGE_SIZE));
        assert!(!can_advance(1, 10, PAGE_SIZE));
    }

    #[test]
    fn empty_history_has_no_pages() {
        assert_eq!(page_count(0, PAGE_SIZE), 0);
        assert!(!can_advance(0, 0, PAGE_SIZE));
    }

    #[test]
    fn retreat_stops_at_first_page() {
        assert!(!can_retreat(0));
        assert!(can_retreat(1));
    }
}
