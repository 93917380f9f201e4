//! Zsh completion script

use super::{function_stem, known_paths, sh_quote, spellings, summary, Level};
use crate::render::writer::CodeWriter;

/// `_describe` entry: the colon separates the word from its description
fn describe_entry(word: &str, description: &str) -> String {
    let word = word.replace(':', "\\:");
    let description = summary(description);
    if description.is_empty() {
        sh_quote(&word)
    } else {
        sh_quote(&format!("{}:{}", word, description))
    }
}

pub(crate) fn render(program: &str, levels: &[Level<'_>]) -> String {
    let function = format!("_{}", function_stem(program));
    let mut w = CodeWriter::new("    ");
    w.line(format!("#compdef {}", program));
    w.blank();
    w.line(format!("# zsh completion for {}", program));
    w.line(format!("# place as _{} in a directory on $fpath", program));
    w.blank();
    w.block(format!("{}() {{", function), "}", |w| {
        w.line("local cmd_path=\"\" word i");
        w.line("local -a opts subs");
        w.blank();
        w.block("for ((i = 2; i < CURRENT; i++)); do", "done", |w| {
            w.line("word=\"${words[i]}\"");
            w.line("[[ \"$word\" == -* ]] && continue");
            w.block("case \"${cmd_path:+$cmd_path }$word\" in", "esac", |w| {
                let paths = known_paths(levels);
                if !paths.is_empty() {
                    let pattern: Vec<String> = paths.iter().map(|p| sh_quote(p)).collect();
                    w.line(format!(
                        "{}) cmd_path=\"${{cmd_path:+$cmd_path }}$word\" ;;",
                        pattern.join("|")
                    ));
                }
            });
        });
        w.blank();
        w.block("case \"$cmd_path\" in", "esac", |w| {
            for level in levels {
                w.scope(format!("{})", sh_quote(&level.path)), |w| {
                    let opts: Vec<String> = level
                        .options
                        .iter()
                        .flat_map(|o| {
                            spellings(o)
                                .into_iter()
                                .map(|s| describe_entry(&s, &o.description))
                                .collect::<Vec<_>>()
                        })
                        .collect();
                    let subs: Vec<String> = level
                        .subcommands
                        .iter()
                        .map(|(name, description)| describe_entry(name, description))
                        .collect();
                    w.line(format!("opts=({})", opts.join(" ")));
                    w.line(format!("subs=({})", subs.join(" ")));
                    w.line(";;");
                });
            }
        });
        w.blank();
        w.block("if [[ \"${words[CURRENT]}\" == -* ]]; then", "fi", |w| {
            w.line("_describe -t options 'option' opts");
            w.dedent();
            w.line("else");
            w.indent();
            w.line("_describe -t commands 'command' subs");
        });
    });
    w.blank();
    w.block(
        format!("if [ \"$funcstack[1]\" = \"{}\" ]; then", function),
        "fi",
        |w| {
            w.line(format!("{} \"$@\"", function));
            w.dedent();
            w.line("else");
            w.indent();
            w.line(format!("compdef {} {}", function, program));
        },
    );
    w.finish()
}
