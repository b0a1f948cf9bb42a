/// Find each of the `needles` in the `haystack`, in order, each search starting after the end of the previous match.
///
/// Returns the index of the first needle that could not be found.
pub fn find_inorder(haystack: &str, needles: &[&str]) -> Result<(), usize> {
    let mut remaining = haystack;
    for (index, needle) in needles.iter().enumerate() {
        match remaining.find(needle) {
            Some(position) => remaining = &remaining[position + needle.len()..],
            None => return Err(index),
        }
    }
    Ok(())
}

/// Assert that all the strings appear in the content, in the order given.
///
/// e.g. `assert_contains_inorder!(trace_content, ["Created workflow", "Bound target composition"]);`
#[macro_export]
macro_rules! assert_contains_inorder {
    ($content:expr, [$($needle:expr),* $(,)?]) => {{
        let needles: Vec<&str> = vec![$($needle),*];
        if let Err(index) = $crate::assert::find_inorder(&$content, &needles) {
            panic!(
                "content does not contain expected string (in order). index: {}, expected: {:?}, content:\n{}",
                index, needles[index], $content
            );
        }
    }};
}
