//! Output assembly.
//!
//! A pure function of the rewriter's block stream: blocks are joined
//! with one blank line between them. The trailing end-of-line is the
//! writer's concern, not the compiler's.

/// Separator between emitted declaration blocks
pub(crate) const BLOCK_SEPARATOR: &str = "\n\n";

/// Join emitted blocks into one artifact
pub(crate) fn join_blocks(blocks: &[String]) -> String {
    blocks.join(BLOCK_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_blocks() {
        let blocks = vec![
            "declare module 'a' {\n}".to_string(),
            "declare module 'b' {\n}".to_string(),
        ];
        assert_eq!(
            join_blocks(&blocks),
            "declare module 'a' {\n}\n\ndeclare module 'b' {\n}"
        );
    }

    #[test]
    fn test_single_block_has_no_separator() {
        let blocks = vec!["declare module 'a' {\n}".to_string()];
        assert_eq!(join_blocks(&blocks), "declare module 'a' {\n}");
    }
}
