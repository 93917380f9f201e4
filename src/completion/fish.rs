//! Fish completion script

use super::{function_stem, known_paths, summary, takes_value, Level};
use crate::render::writer::CodeWriter;

/// Fish single-quoted string
fn fish_quote(text: &str) -> String {
    format!("'{}'", text.replace('\\', "\\\\").replace('\'', "\\'"))
}

pub(crate) fn render(program: &str, levels: &[Level<'_>]) -> String {
    let stem = function_stem(program);
    let path_fn = format!("__{}_path", stem);
    let at_fn = format!("__{}_at", stem);
    let mut w = CodeWriter::new("    ");
    w.line(format!("# fish completion for {}", program));
    w.line(format!("# copy to ~/.config/fish/completions/{}.fish", program));
    w.blank();
    w.line("# Command path typed so far, options skipped");
    w.block(format!("function {}", path_fn), "end", |w| {
        w.line("set -l tokens (commandline -opc)");
        w.line("set -l path");
        w.block("for token in $tokens[2..-1]", "end", |w| {
            w.block("if string match -q -- '-*' $token", "end", |w| {
                w.line("continue");
            });
            w.line("set -l candidate (string join ' ' $path $token)");
            let paths: Vec<String> = known_paths(levels).iter().map(|p| fish_quote(p)).collect();
            w.block(
                format!("if contains -- $candidate {}", paths.join(" ")),
                "end",
                |w| {
                    w.line("set path $path $token");
                },
            );
        });
        w.line("string join ' ' $path");
    });
    w.blank();
    w.block(format!("function {}", at_fn), "end", |w| {
        w.line(format!("set -l current ({})", path_fn));
        w.line("test \"$current\" = \"$argv[1]\"");
    });
    w.blank();
    w.line(format!("complete -c {} -f", program));

    for level in levels {
        let condition = fish_quote(&format!("{} {}", at_fn, fish_quote(&level.path)));
        w.blank();
        for (name, description) in &level.subcommands {
            let mut line = format!("complete -c {} -n {} -a {}", program, condition, fish_quote(name));
            let description = summary(description);
            if !description.is_empty() {
                line.push_str(&format!(" -d {}", fish_quote(description)));
            }
            w.line(line);
        }
        for option in &level.options {
            let mut line = format!("complete -c {} -n {} -l {}", program, condition, option.name);
            if let Some(c) = option.short {
                line.push_str(&format!(" -s {}", c));
            }
            if takes_value(option) {
                line.push_str(" -r");
            }
            let description = summary(&option.description);
            if !description.is_empty() {
                line.push_str(&format!(" -d {}", fish_quote(description)));
            }
            w.line(line);
        }
    }
    w.finish()
}

#[cfg(test)]
mod tests {
    use super::super::tests::demo_tree;
    use super::fish_quote;
    use crate::completion::{render, Shell};

    #[test]
    fn test_fish_conditions() {
        let script = render(&demo_tree(), Shell::Fish);
        assert!(script.contains(
            "if contains -- $candidate 'simple' 'greet' 'database' 'database status' 'database migrate'"
        ));
        assert!(script.contains(
            "complete -c demo -n '__demo_at \\'database\\'' -a 'status' -d 'Show status'"
        ));
        assert!(script.contains(
            "complete -c demo -n '__demo_at \\'database status\\'' -l format -s f -r"
        ));
        assert!(script.contains("complete -c demo -n '__demo_at \\'\\'' -l config -s c -r -d 'Config file'"));
    }

    #[test]
    fn test_fish_quote() {
        assert_eq!(fish_quote("It's"), "'It\\'s'");
        assert_eq!(fish_quote("a\\b"), "'a\\\\b'");
    }
}
