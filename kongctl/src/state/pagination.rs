//! Pagination helper shared by every `List` implementation (§4.F): iterate
//! until the running total reaches the server-reported total, or until a
//! page comes back empty.

use crate::Result;

pub struct Page {
    pub items: Vec<serde_json::Value>,
    pub total: Option<usize>,
}

pub fn paginate<F>(page_size: usize, mut fetch_page: F) -> Result<Vec<serde_json::Value>>
where
    F: FnMut(usize, usize) -> Result<Page>,
{
    let mut all = Vec::new();
    let mut offset = 0usize;
    loop {
        let page = fetch_page(offset, page_size)?;
        let got = page.items.len();
        if got == 0 {
            break;
        }
        all.extend(page.items);
        offset += got;
        if let Some(total) = page.total {
            if all.len() >= total {
                break;
            }
        }
        if got < page_size {
            break;
        }
    }
    Ok(all)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn stops_at_reported_total() {
        let calls = RefCell::new(0);
        let all = paginate(2, |_offset, _size| {
            let mut n = calls.borrow_mut();
            *n += 1;
            let items = match *n {
                1 => vec![serde_json::json!(1), serde_json::json!(2)],
                2 => vec![serde_json::json!(3)],
                _ => panic!("should not be called a third time"),
            };
            Ok(Page { items, total: Some(3) })
        })
        .unwrap();
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn stops_on_empty_page_without_total() {
        let calls = RefCell::new(0);
        let all = paginate(2, |_offset, _size| {
            let mut n = calls.borrow_mut();
            *n += 1;
            let items = if *n == 1 { vec![serde_json::json!(1), serde_json::json!(2)] } else { vec![] };
            Ok(Page { items, total: None })
        })
        .unwrap();
        assert_eq!(all.len(), 2);
    }
}
