//! # Graph XML
//!
//! ```xml
//! <graph>
//!   <variables>
//!     <variable name="A"/>
//!   </variables>
//!   <edges>
//!     <edge>A --&gt; B</edge>
//!   </edges>
//! </graph>
//! ```
//!
//! Edge bodies use the graph-text glyphs. Write only.

use crate::graph::CausalGraph;
use std::fmt::Write;

/// Render a graph as XML.
#[must_use]
pub fn write_xml(graph: &CausalGraph) -> String {
    let mut out = String::from("<graph>\n  <variables>\n");
    for node in graph.nodes() {
        let _ = writeln!(out, "    <variable name=\"{}\"/>", escape(node));
    }
    out.push_str("  </variables>\n  <edges>\n");
    for edge in graph.edges() {
        let _ = writeln!(out, "    <edge>{}</edge>", escape(&edge.to_string()));
    }
    out.push_str("  </edges>\n</graph>\n");
    out
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Edge;

    #[test]
    fn variables_then_edges() {
        let mut g = CausalGraph::with_nodes(["A", "B", "C"]).expect("nodes");
        g.add_edge(Edge::directed("A", "B")).expect("edge");
        g.add_edge(Edge::bidirected("B", "C")).expect("edge");
        let xml = write_xml(&g);

        assert!(xml.starts_with("<graph>\n  <variables>\n    <variable name=\"A\"/>\n"));
        assert!(xml.contains("<edge>A --&gt; B</edge>"));
        assert!(xml.contains("<edge>B &lt;-&gt; C</edge>"));
        assert!(xml.ends_with("  </edges>\n</graph>\n"));
    }

    #[test]
    fn empty_graph_keeps_both_sections() {
        assert_eq!(
            write_xml(&CausalGraph::new()),
            "<graph>\n  <variables>\n  </variables>\n  <edges>\n  </edges>\n</graph>\n"
        );
    }

    #[test]
    fn names_are_escaped() {
        let g = CausalGraph::with_nodes(["a&b", "\"q\""]).expect("nodes");
        let xml = write_xml(&g);
        assert!(xml.contains("<variable name=\"a&amp;b\"/>"));
        assert!(xml.contains("<variable name=\"&quot;q&quot;\"/>"));
    }
}
