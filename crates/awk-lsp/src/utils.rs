//! Small shared helpers.

/// Left-align a raw `##` doc-comment block: strip `##` and the widest
/// whitespace run common to every content line.
pub(crate) fn align_doc_comment(raw: &str) -> String {
    let stripped: Vec<&str> = raw
        .lines()
        .map(|line| line.trim_start().strip_prefix("##").unwrap_or(line))
        .collect();
    let common = stripped
        .iter()
        .filter(|rest| !rest.trim().is_empty())
        .map(|rest| rest.len() - rest.trim_start().len())
        .min()
        .unwrap_or(0);
    stripped
        .iter()
        .map(|rest| rest.get(common..).unwrap_or(""))
        .collect::<Vec<&str>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alignment_strips_the_common_prefix() {
        let raw = "## Sums the first n integers.\n##   n - upper bound";
        assert_eq!(
            align_doc_comment(raw),
            "Sums the first n integers.\n  n - upper bound"
        );
    }

    #[test]
    fn blank_comment_lines_do_not_defeat_alignment() {
        let raw = "##  one\n##\n##  two";
        assert_eq!(align_doc_comment(raw), "one\n\ntwo");
    }

    #[test]
    fn single_line_comment_loses_only_its_prefix() {
        assert_eq!(align_doc_comment("## terse"), "terse");
        assert_eq!(align_doc_comment(""), "");
    }
}
