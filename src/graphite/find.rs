//! `/metrics/find` response body
//!
//! ```text
//! [
//! {"leaf": 0, "context": {}, "text": "web1", "expandable": 1, "id": "servers.web1", "allowChildren": 1},
//! {"leaf": 1, "context": {}, "text": "total", "expandable": 0, "id": "servers.total", "allowChildren": 0}
//! ]
//! ```

use std::io::{self, Write};

use crate::graphite::write_json_str;
use crate::storage::TreeNode;

/// Write the find JSON array for `nodes`, preserving their order
pub fn write_find_response<W: Write>(out: &mut W, nodes: &[TreeNode]) -> io::Result<()> {
    out.write_all(b"[\n")?;

    for (i, node) in nodes.iter().enumerate() {
        if i > 0 {
            out.write_all(b",\n")?;
        }

        let leaf = u8::from(node.leaf);
        let expandable = 1 - leaf;

        write!(out, r#"{{"leaf": {}, "context": {{}}, "text": "#, leaf)?;
        write_json_str(out, node.text())?;
        write!(out, r#", "expandable": {}, "id": "#, expandable)?;
        write_json_str(out, &node.name)?;
        write!(out, r#", "allowChildren": {}}}"#, expandable)?;
    }

    out.write_all(b"\n]\n")
}
