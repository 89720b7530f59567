//! Phrase hierarchy post-processing.
//!
//! Turns the flat mined result set into a browsable hierarchy: each phrase
//! is linked to the longest shorter phrase in the set that it contains as a
//! prefix or suffix (its parent), levels are derived from the parent chain,
//! and the result is written as an enriched CSV plus a self-contained
//! collapsible HTML tree.

use std::io::{self, Write};

use hashbrown::{HashMap, HashSet};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::output::quote_field;

/// One row of the mined result set, as consumed by the tree builder.
#[derive(Debug, Clone)]
pub struct PhraseRecord {
    /// Space-joined surface text.
    pub phrase: String,
    /// Distinct-document support.
    pub freq: u32,
    /// Phrase length in tokens.
    pub length: usize,
}

/// A phrase with its position in the hierarchy.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PhraseNode {
    /// Index in the length-sorted node list.
    pub id: usize,
    /// Longest contained sub-phrase, if any exists in the set.
    pub parent_id: Option<usize>,
    /// Depth of the parent chain; roots are level 0.
    pub level: u32,
    /// Normalized surface text.
    pub phrase: String,
    /// Surface text with the parent replaced by a `<PARENT>` placeholder.
    pub display_phrase: String,
    /// Distinct-document support.
    pub freq: u32,
    /// Phrase length in tokens.
    pub length: usize,
}

/// Link every phrase to its longest existing parent.
///
/// Nodes are sorted shortest-first and assigned dense ids, so a parent is
/// always processed (and leveled) before its children. The parent search
/// strips one word at a time from the start, then from the end; the first
/// hit is the longest sub-phrase present in the set. Candidate parents are
/// never shorter than `min_len` words.
#[tracing::instrument(skip_all, fields(phrases = records.len(), min_len))]
pub fn build_phrase_tree(records: &[PhraseRecord], min_len: usize) -> Vec<PhraseNode> {
    let mut nodes: Vec<PhraseNode> = records
        .iter()
        .map(|r| {
            let phrase = normalize_phrase(&r.phrase);
            PhraseNode {
                id: 0,
                parent_id: None,
                level: 0,
                display_phrase: phrase.clone(),
                phrase,
                freq: r.freq,
                length: r.length,
            }
        })
        .collect();
    // Shortest first; the sort is stable, so input order breaks length ties.
    nodes.sort_by_key(|n| n.length);
    for (i, node) in nodes.iter_mut().enumerate() {
        node.id = i;
    }

    let phrase_to_id: HashMap<String, usize> =
        nodes.iter().map(|n| (n.phrase.clone(), n.id)).collect();

    for i in 0..nodes.len() {
        let phrase = nodes[i].phrase.clone();
        let words: Vec<&str> = phrase.split_whitespace().collect();
        let len = words.len();

        'search: for drop in 1..=len.saturating_sub(min_len) {
            let suffix = words[drop..].join(" ");
            let prefix = words[..len - drop].join(" ");
            for candidate in [suffix, prefix] {
                if let Some(&parent_id) = phrase_to_id.get(candidate.as_str()) {
                    let parent_level = nodes[parent_id].level;
                    let parent_phrase = nodes[parent_id].phrase.clone();
                    let display = phrase.replacen(&parent_phrase, " <PARENT> ", 1);
                    let node = &mut nodes[i];
                    node.parent_id = Some(parent_id);
                    node.level = parent_level + 1;
                    node.display_phrase = collapse_whitespace(&display);
                    break 'search;
                }
            }
        }
    }

    debug!(
        nodes = nodes.len(),
        roots = nodes.iter().filter(|n| n.parent_id.is_none()).count(),
        "phrase tree linked"
    );
    nodes
}

/// Write the hierarchy as CSV, one row per node in id order.
pub fn write_tree_csv<W: Write>(mut out: W, nodes: &[PhraseNode]) -> io::Result<()> {
    writeln!(out, "phrase,freq,length,id,parent_id,level,display_phrase")?;
    for n in nodes {
        let parent = n.parent_id.map(|p| p.to_string()).unwrap_or_default();
        writeln!(
            out,
            "{},{},{},{},{},{},{}",
            quote_field(&n.phrase),
            n.freq,
            n.length,
            n.id,
            parent,
            n.level,
            quote_field(&n.display_phrase),
        )?;
    }
    Ok(())
}

/// Node shape embedded in the HTML page.
#[derive(Serialize)]
struct JsonNode<'a> {
    id: usize,
    freq: u32,
    length: usize,
    display_phrase: &'a str,
    children: Vec<JsonNode<'a>>,
}

/// Render a self-contained collapsible HTML tree of the best `max_nodes`
/// nodes.
///
/// Node quality is the distance from the ideal corner of the
/// (length, freq) space — lower is better — and every ancestor of a kept
/// node is kept too, so no child ever dangles. Siblings are ordered by
/// descending freq.
#[tracing::instrument(skip_all, fields(nodes = nodes.len(), max_nodes))]
pub fn render_html(nodes: &[PhraseNode], max_nodes: usize) -> serde_json::Result<String> {
    let visible = select_with_ancestors(nodes, max_nodes);
    let mut ids: Vec<usize> = visible.iter().copied().collect();
    ids.sort_unstable();

    let mut children: HashMap<usize, Vec<usize>> = HashMap::new();
    let mut roots: Vec<usize> = Vec::new();
    for &id in &ids {
        match nodes[id].parent_id.filter(|p| visible.contains(p)) {
            Some(parent) => children.entry(parent).or_default().push(id),
            None => roots.push(id),
        }
    }
    let freq_desc = |a: &usize, b: &usize| nodes[*b].freq.cmp(&nodes[*a].freq).then(a.cmp(b));
    roots.sort_by(freq_desc);
    for list in children.values_mut() {
        list.sort_by(freq_desc);
    }

    let tree: Vec<JsonNode> = roots
        .iter()
        .map(|&id| build_json_node(id, nodes, &children))
        .collect();
    let data = serde_json::to_string(&tree)?;
    Ok(HTML_TEMPLATE.replace("%DATA%", &data))
}

fn build_json_node<'a>(
    id: usize,
    nodes: &'a [PhraseNode],
    children: &HashMap<usize, Vec<usize>>,
) -> JsonNode<'a> {
    let node = &nodes[id];
    JsonNode {
        id,
        freq: node.freq,
        length: node.length,
        display_phrase: &node.display_phrase,
        children: children
            .get(&id)
            .map(|c| {
                c.iter()
                    .map(|&child| build_json_node(child, nodes, children))
                    .collect()
            })
            .unwrap_or_default(),
    }
}

/// The best `max_nodes` node ids plus every ancestor of a kept node.
fn select_with_ancestors(nodes: &[PhraseNode], max_nodes: usize) -> HashSet<usize> {
    let max_len = nodes.iter().map(|n| n.length).max().unwrap_or(1) as f64;
    let max_freq = nodes.iter().map(|n| n.freq).max().unwrap_or(1) as f64;
    let score = |n: &PhraseNode| {
        let l = 1.0 - n.length as f64 / max_len;
        let f = 1.0 - n.freq as f64 / max_freq;
        (l * l + f * f).sqrt()
    };

    let mut order: Vec<usize> = (0..nodes.len()).collect();
    order.sort_by(|&a, &b| {
        score(&nodes[a])
            .total_cmp(&score(&nodes[b]))
            .then(a.cmp(&b))
    });
    order.truncate(max_nodes);

    let mut visible: HashSet<usize> = order.iter().copied().collect();
    for &id in &order {
        let mut current = nodes[id].parent_id;
        while let Some(parent) = current {
            if !visible.insert(parent) {
                break;
            }
            current = nodes[parent].parent_id;
        }
    }
    visible
}

/// Lowercase and collapse runs of whitespace to single spaces.
fn normalize_phrase(phrase: &str) -> String {
    collapse_whitespace(&phrase.to_lowercase())
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

const HTML_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="UTF-8">
<title>Phrase tree</title>
<style>
  body { font-family: sans-serif; margin: 2em; }
  ul.phrase-tree, .phrase-tree ul { list-style: none; padding-left: 1.5em; }
  .row { cursor: pointer; padding: 2px 0; }
  .row:hover { background: #eef2ff; }
  .stats { color: #667; font-size: 0.8em; margin-left: 0.6em; }
  .closed > ul { display: none; }
  .mark::before { content: "\25B8 "; color: #889; }
  .open > .row .mark::before { content: "\25BE "; }
  .leaf > .row .mark::before { content: "\00B7 "; }
</style>
</head>
<body>
<h1>Phrase tree</h1>
<ul class="phrase-tree" id="root"></ul>
<script>
const NODES = %DATA%;
function render(node) {
  const li = document.createElement("li");
  li.className = node.children.length ? "closed" : "leaf";
  const row = document.createElement("div");
  row.className = "row";
  const mark = document.createElement("span");
  mark.className = "mark";
  const text = document.createElement("span");
  text.textContent = node.display_phrase;
  const stats = document.createElement("span");
  stats.className = "stats";
  stats.textContent = "freq " + node.freq + ", len " + node.length;
  row.append(mark, text, stats);
  li.appendChild(row);
  if (node.children.length) {
    const ul = document.createElement("ul");
    node.children.forEach(c => ul.appendChild(render(c)));
    li.appendChild(ul);
    row.addEventListener("click", e => {
      li.classList.toggle("closed");
      li.classList.toggle("open");
      e.stopPropagation();
    });
  }
  return li;
}
const root = document.getElementById("root");
NODES.forEach(n => root.appendChild(render(n)));
</script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(phrase: &str, freq: u32) -> PhraseRecord {
        PhraseRecord {
            phrase: phrase.to_string(),
            freq,
            length: phrase.split_whitespace().count(),
        }
    }

    fn node<'a>(nodes: &'a [PhraseNode], phrase: &str) -> &'a PhraseNode {
        nodes
            .iter()
            .find(|n| n.phrase == phrase)
            .unwrap_or_else(|| panic!("missing node {phrase:?}"))
    }

    #[test]
    fn links_to_longest_existing_parent() {
        // "a b c" is absent, so "a b c d" must fall through to "a b"
        let nodes = build_phrase_tree(&[rec("a b", 5), rec("a b c d", 2)], 2);
        let child = node(&nodes, "a b c d");
        assert_eq!(child.parent_id, Some(node(&nodes, "a b").id));
        assert_eq!(child.level, 1);
        assert_eq!(child.display_phrase, "<PARENT> c d");
    }

    #[test]
    fn suffix_parent_wins_over_prefix_at_equal_length() {
        let nodes = build_phrase_tree(&[rec("a b", 3), rec("b c", 3), rec("a b c", 2)], 2);
        let child = node(&nodes, "a b c");
        assert_eq!(child.parent_id, Some(node(&nodes, "b c").id));
        assert_eq!(child.display_phrase, "a <PARENT>");
    }

    #[test]
    fn levels_follow_the_parent_chain() {
        let nodes = build_phrase_tree(
            &[rec("a b", 9), rec("a b c", 5), rec("a b c d", 2)],
            2,
        );
        assert_eq!(node(&nodes, "a b").level, 0);
        assert_eq!(node(&nodes, "a b c").level, 1);
        assert_eq!(node(&nodes, "a b c d").level, 2);
    }

    #[test]
    fn parents_shorter_than_the_floor_are_not_linked() {
        // With a floor of 3, "a b" is not an eligible parent
        let nodes = build_phrase_tree(&[rec("a b", 5), rec("a b c", 2)], 3);
        assert!(node(&nodes, "a b c").parent_id.is_none());
        assert_eq!(node(&nodes, "a b c").level, 0);
    }

    #[test]
    fn phrases_are_normalized() {
        let nodes = build_phrase_tree(&[rec("  Big   DATA ", 1)], 2);
        assert_eq!(nodes[0].phrase, "big data");
        assert_eq!(nodes[0].display_phrase, "big data");
    }

    #[test]
    fn ids_are_dense_and_shortest_first() {
        let nodes = build_phrase_tree(&[rec("x y z", 1), rec("x y", 1)], 2);
        assert_eq!(nodes[0].phrase, "x y");
        assert_eq!(nodes[0].id, 0);
        assert_eq!(nodes[1].id, 1);
    }

    #[test]
    fn selection_keeps_ancestors_of_kept_nodes() {
        // "a b c d" scores best (max length and max freq); with room for one
        // node its whole parent chain must still be retained.
        let nodes = build_phrase_tree(
            &[rec("a b", 1), rec("a b c", 1), rec("a b c d", 5)],
            2,
        );
        let visible = select_with_ancestors(&nodes, 1);
        assert_eq!(visible.len(), 3);
    }

    #[test]
    fn tree_csv_shape() {
        let nodes = build_phrase_tree(&[rec("a b", 4), rec("a b c", 2)], 2);
        let mut buf = Vec::new();
        write_tree_csv(&mut buf, &nodes).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("phrase,freq,length,id,parent_id,level,display_phrase")
        );
        assert_eq!(lines.next(), Some("\"a b\",4,2,0,,0,\"a b\""));
        assert_eq!(lines.next(), Some("\"a b c\",2,3,1,0,1,\"<PARENT> c\""));
    }

    #[test]
    fn html_embeds_the_hierarchy() {
        let nodes = build_phrase_tree(&[rec("a b", 4), rec("a b c", 2)], 2);
        let html = render_html(&nodes, 100).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("\"display_phrase\":\"<PARENT> c\""));
        assert!(html.contains("\"children\":[]"));
    }

    #[test]
    fn html_respects_the_node_limit() {
        let records: Vec<PhraseRecord> =
            (0..10).map(|i| rec(&format!("solo{i} word"), i + 1)).collect();
        let nodes = build_phrase_tree(&records, 2);
        let html = render_html(&nodes, 3).unwrap();
        // Unrelated roots gain no ancestors, so exactly three survive
        assert_eq!(html.matches("\"display_phrase\"").count(), 3);
    }

    #[test]
    fn duplicate_freq_sibling_order_is_deterministic() {
        let nodes = build_phrase_tree(&[rec("p q", 2), rec("r s", 2)], 2);
        let a = render_html(&nodes, 10).unwrap();
        let b = render_html(&nodes, 10).unwrap();
        assert_eq!(a, b);
    }
}
