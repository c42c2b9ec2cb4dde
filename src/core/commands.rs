use crate::domain::model::BotCommand;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    StartCollect,
    StopCollect,
    Version,
    /// `/filename` optionally followed by the name itself.
    FileName(Option<String>),
}

// Telegram 只接受小寫的指令名稱
const COMMANDS: &[(&str, &str)] = &[
    ("start", "显示此帮助信息"),
    ("help", "显示此帮助信息"),
    ("startcollect", "开始收集图片信息"),
    ("stopcollect", "停止收集并打包下载所有图片"),
    ("version", "显示程序版本"),
    ("filename", "设置zip名称"),
];

impl Command {
    /// Parses `/name[@bot] [args]`. Returns `None` for anything that is not one of our commands,
    /// including commands addressed to another bot.
    pub fn parse(text: &str, bot_username: Option<&str>) -> Option<Self> {
        let rest = text.strip_prefix('/')?;

        let (head, args) = match rest.split_once(char::is_whitespace) {
            Some((head, args)) => (head, args.trim()),
            None => (rest, ""),
        };

        let name = match head.split_once('@') {
            Some((name, mention)) => match bot_username {
                Some(username) if username.eq_ignore_ascii_case(mention) => name,
                _ => return None,
            },
            None => head,
        };

        let command = match name {
            "start" => Command::Start,
            "help" => Command::Help,
            "startcollect" => Command::StartCollect,
            "stopcollect" => Command::StopCollect,
            "version" => Command::Version,
            "filename" => Command::FileName((!args.is_empty()).then(|| args.to_string())),
            _ => return None,
        };
        Some(command)
    }

    pub fn bot_commands() -> Vec<BotCommand> {
        COMMANDS
            .iter()
            .map(|(command, description)| BotCommand {
                command: command.to_string(),
                description: description.to_string(),
            })
            .collect()
    }
}

pub fn help_text() -> &'static str {
    "你好！我是图片下载机器人。\n\n\
     /startcollect - 开始收集图片\n\
     /stopcollect - 停止并打包下载\n\
     /filename - 设置文件名称\n\
     /version - 显示程序版本"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_commands() {
        assert_eq!(Command::parse("/start", None), Some(Command::Start));
        assert_eq!(Command::parse("/help", None), Some(Command::Help));
        assert_eq!(
            Command::parse("/startcollect", None),
            Some(Command::StartCollect)
        );
        assert_eq!(
            Command::parse("/stopcollect extra words", None),
            Some(Command::StopCollect)
        );
        assert_eq!(Command::parse("/version", None), Some(Command::Version));
        assert_eq!(Command::parse("/filename", None), Some(Command::FileName(None)));
    }

    #[test]
    fn test_filename_argument() {
        assert_eq!(
            Command::parse("/filename  summer trip ", None),
            Some(Command::FileName(Some("summer trip".to_string())))
        );
    }

    #[test]
    fn test_not_a_command() {
        assert_eq!(Command::parse("hello", None), None);
        assert_eq!(Command::parse("/unknown", None), None);
        assert_eq!(Command::parse("/StartCollect", None), None);
        assert_eq!(Command::parse(" /start", None), None);
    }

    #[test]
    fn test_bot_mention() {
        assert_eq!(
            Command::parse("/stopcollect@ImagesBot", Some("imagesbot")),
            Some(Command::StopCollect)
        );
        assert_eq!(Command::parse("/stopcollect@OtherBot", Some("imagesbot")), None);
        assert_eq!(Command::parse("/stopcollect@ImagesBot", None), None);
    }

    #[test]
    fn test_bot_commands_are_lowercase() {
        let commands = Command::bot_commands();
        assert_eq!(commands.len(), 6);
        assert!(commands
            .iter()
            .all(|c| c.command == c.command.to_lowercase()));
    }
}
