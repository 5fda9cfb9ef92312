use std::io::{self, Write};

use coral_client::ReplyTree;

pub fn write_tree(w: &mut impl Write, tree: &ReplyTree) -> io::Result<()> {
    let indent = "  ".repeat(usize::from(tree.view.indent_level));
    if tree.view.view_new_count > 0 {
        writeln!(w, "{indent}[{} new replies]", tree.view.view_new_count)?;
    }
    for (reply, nested) in tree.view.comments.iter().zip(tree.nested.iter()) {
        let mut line = format!("{indent}- {}", reply.comment.body);
        if let Some(n) = reply.comment.reply_count {
            line.push_str(&format!(" ({n} replies)"));
        }
        if reply.show_conversation_link {
            line.push_str(" [read more of this conversation]");
        }
        writeln!(w, "{line}")?;
        if let Some(nested) = nested {
            write_tree(w, nested)?;
        }
    }
    if tree.view.has_more {
        writeln!(w, "{indent}[show all replies]")?;
    }
    Ok(())
}
