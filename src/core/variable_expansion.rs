use nix::unistd::Pid;

/// The only variable the interpreter understands: its own process id.
pub const PID_VARIABLE: &str = "$$";

/// Replaces every `$$` in `line`, left to right, with `pid`.
///
/// Occurrences never overlap, so `$$$$` expands twice and `$$$` expands once,
/// leaving the final `$` untouched.
pub fn expand_variables(line: &str, pid: Pid) -> String {
    if !line.contains(PID_VARIABLE) {
        return line.to_string();
    }

    let expanded = line.replace(PID_VARIABLE, &pid.to_string());
    debug!("expanded '{}' to '{}'", line, expanded);
    expanded
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid() -> Pid {
        Pid::from_raw(4242)
    }

    #[test]
    fn test_no_variables() {
        assert_eq!(expand_variables("ls -la", pid()), "ls -la");
        assert_eq!(expand_variables("", pid()), "");
        assert_eq!(expand_variables("echo $", pid()), "echo $");
    }

    #[test]
    fn test_every_occurrence_expanded() {
        assert_eq!(
            expand_variables("echo $$ foo$$bar", pid()),
            "echo 4242 foo4242bar"
        );
    }

    #[test]
    fn test_adjacent_occurrences() {
        assert_eq!(expand_variables("$$$$", pid()), "42424242");
        assert_eq!(expand_variables("$$$", pid()), "4242$");
    }

    #[test]
    fn test_expansion_is_idempotent() {
        let once = expand_variables("mkdir dir.$$ && echo $$$$", pid());
        assert_eq!(expand_variables(&once, pid()), once);
    }

    #[test]
    fn test_uses_own_pid() {
        let this = Pid::this();
        assert_eq!(expand_variables("$$", this), this.to_string());
    }
}
