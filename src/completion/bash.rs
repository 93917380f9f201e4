//! Bash completion script

use super::{function_stem, known_paths, sh_quote, spellings, Level};
use crate::render::writer::CodeWriter;

pub(crate) fn render(program: &str, levels: &[Level<'_>]) -> String {
    let function = format!("_{}_completions", function_stem(program));
    let mut w = CodeWriter::new("    ");
    w.line(format!("# bash completion for {}", program));
    w.line(format!("# source this file, or copy it to ~/.bash_completion.d/{}", program));
    w.blank();
    w.block(format!("{}() {{", function), "}", |w| {
        w.line("local cur word path opts subs i");
        w.line("cur=\"${COMP_WORDS[COMP_CWORD]}\"");
        w.line("path=\"\"");
        w.blank();
        w.block("for ((i = 1; i < COMP_CWORD; i++)); do", "done", |w| {
            w.line("word=\"${COMP_WORDS[i]}\"");
            w.line("[[ \"$word\" == -* ]] && continue");
            w.block("case \"${path:+$path }$word\" in", "esac", |w| {
                let paths = known_paths(levels);
                if !paths.is_empty() {
                    let pattern: Vec<String> = paths.iter().map(|p| sh_quote(p)).collect();
                    w.line(format!(
                        "{}) path=\"${{path:+$path }}$word\" ;;",
                        pattern.join("|")
                    ));
                }
            });
        });
        w.blank();
        w.block("case \"$path\" in", "esac", |w| {
            for level in levels {
                let opts: Vec<String> = level.options.iter().flat_map(|o| spellings(o)).collect();
                let subs: Vec<&str> = level.subcommands.iter().map(|(name, _)| *name).collect();
                w.scope(format!("{})", sh_quote(&level.path)), |w| {
                    w.line(format!("opts={}", sh_quote(&opts.join(" "))));
                    w.line(format!("subs={}", sh_quote(&subs.join(" "))));
                    w.line(";;");
                });
            }
        });
        w.blank();
        w.block("if [[ \"$cur\" == -* ]]; then", "fi", |w| {
            w.line("COMPREPLY=($(compgen -W \"$opts\" -- \"$cur\"))");
            w.dedent();
            w.line("else");
            w.indent();
            w.line("COMPREPLY=($(compgen -W \"$subs\" -- \"$cur\"))");
        });
    });
    w.blank();
    w.line(format!("complete -o default -F {} {}", function, program));
    w.finish()
}
