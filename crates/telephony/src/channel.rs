//! Call channel: high-level line primitives over the AGI wire
//!
//! One command in flight at a time; the channel is a single duplex stream.
//! Every primitive checks the response for hangup markers and surfaces
//! [`Error::Hangup`](taxi_agent_core::Error::Hangup) immediately.

use async_trait::async_trait;
use taxi_agent_core::{Error, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::protocol::{AgiEnv, AgiResponse};

/// High-level line operations the orchestrator runs a call with
///
/// The wire implementation is [`AgiChannel`]; scenario tests use scripted
/// mocks.
#[async_trait]
pub trait CallChannel: Send {
    /// Play a sound file (path without extension)
    async fn play(&mut self, sound: &str) -> Result<()>;

    /// Play a prompt and read up to `digits` DTMF digits; empty string on
    /// timeout without input
    async fn read_dtmf(&mut self, prompt: &str, digits: u32, timeout_secs: u32) -> Result<String>;

    /// Record bounded audio to `<path>.wav`; `#` or silence ends the take
    async fn record(&mut self, path: &str, max_ms: u32) -> Result<()>;

    /// Idempotent liveness probe, used to tell a read timeout from a dead
    /// line
    async fn channel_alive(&mut self) -> Result<bool>;

    /// Pause the flow for `seconds`
    async fn wait(&mut self, seconds: u32) -> Result<()>;

    /// Transfer to another line (operator fallback)
    async fn dial(&mut self, target: &str, timeout_secs: u32) -> Result<()>;

    /// Unconditional hangup
    async fn hangup(&mut self) -> Result<()>;

    /// Keep the line filled during an external round-trip
    async fn start_hold_music(&mut self) -> Result<()>;
    async fn stop_hold_music(&mut self) -> Result<()>;
}

/// The AGI wire channel
///
/// Generic over the stream halves so the same code serves stdio AGI and a
/// FastAGI socket.
pub struct AgiChannel<R, W> {
    reader: R,
    writer: W,
    env: AgiEnv,
}

impl<R, W> AgiChannel<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    /// Read the environment block the host sends at session start
    pub async fn accept(reader: R, writer: W) -> Result<Self> {
        let mut channel = Self {
            reader,
            writer,
            env: AgiEnv::default(),
        };
        loop {
            let line = channel.read_line().await?;
            let mut env = std::mem::take(&mut channel.env);
            let more = env.push_line(&line);
            channel.env = env;
            if !more {
                break;
            }
        }
        tracing::debug!(
            call_id = channel.env.unique_id(),
            extension = channel.env.extension(),
            "accepted call session"
        );
        Ok(channel)
    }

    pub fn env(&self) -> &AgiEnv {
        &self.env
    }

    async fn read_line(&mut self) -> Result<String> {
        let mut line = String::new();
        let n = self.reader.read_line(&mut line).await?;
        if n == 0 {
            // Stream closed under us: the caller is gone.
            return Err(Error::Hangup);
        }
        Ok(line)
    }

    /// Send one command and parse its response; single in-flight by `&mut`.
    pub async fn send_command(&mut self, command: &str) -> Result<AgiResponse> {
        tracing::trace!(command, "agi send");
        self.writer.write_all(command.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;
        let line = self.read_line().await?;
        tracing::trace!(response = line.trim(), "agi recv");
        AgiResponse::parse(&line)
    }

    async fn get_variable(&mut self, name: &str) -> Result<String> {
        let resp = self.send_command(&format!("GET VARIABLE {name}")).await?;
        // result=0 means the variable is unset.
        if resp.result == 0 {
            return Ok(String::new());
        }
        Ok(resp.data.unwrap_or_default())
    }
}

#[async_trait]
impl<R, W> CallChannel for AgiChannel<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn play(&mut self, sound: &str) -> Result<()> {
        self.send_command(&format!("EXEC Playback \"{sound}\"")).await?;
        Ok(())
    }

    async fn read_dtmf(&mut self, prompt: &str, digits: u32, timeout_secs: u32) -> Result<String> {
        self.send_command(&format!(
            "EXEC Read \"AGENT_CHOICE,{prompt},{digits},,1,{timeout_secs}\""
        ))
        .await?;
        self.get_variable("AGENT_CHOICE").await
    }

    async fn record(&mut self, path: &str, max_ms: u32) -> Result<()> {
        self.send_command(&format!(
            "RECORD FILE \"{path}\" wav \"#\" {max_ms} 0 BEEP s=3"
        ))
        .await?;
        Ok(())
    }

    async fn channel_alive(&mut self) -> Result<bool> {
        // Status 6 is "line is up"; anything else means the probe found a
        // dead or tearing-down channel.
        let resp = self.send_command("CHANNEL STATUS").await?;
        Ok(resp.result == 6)
    }

    async fn wait(&mut self, seconds: u32) -> Result<()> {
        self.send_command(&format!("EXEC Wait \"{seconds}\"")).await?;
        Ok(())
    }

    async fn dial(&mut self, target: &str, timeout_secs: u32) -> Result<()> {
        self.send_command(&format!("EXEC Dial \"{target},{timeout_secs}\""))
            .await?;
        Ok(())
    }

    async fn hangup(&mut self) -> Result<()> {
        // The host may close the stream before answering; that is not an
        // error on an intentional hangup.
        match self.send_command("HANGUP").await {
            Ok(_) | Err(Error::Hangup) => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn start_hold_music(&mut self) -> Result<()> {
        self.send_command("EXEC StartMusicOnHold").await?;
        Ok(())
    }

    async fn stop_hold_music(&mut self) -> Result<()> {
        self.send_command("EXEC StopMusicOnHold").await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::BufReader;

    const ENV: &str = "agi_uniqueid: 99.1\nagi_extension: 4039\nagi_callerid: +306911111111\n\n";

    async fn channel_with(
        responses: &str,
    ) -> AgiChannel<BufReader<std::io::Cursor<Vec<u8>>>, Vec<u8>> {
        let input = format!("{ENV}{responses}");
        let reader = BufReader::new(std::io::Cursor::new(input.into_bytes()));
        AgiChannel::accept(reader, Vec::new()).await.unwrap()
    }

    #[tokio::test]
    async fn accept_parses_the_environment() {
        let channel = channel_with("").await;
        assert_eq!(channel.env().unique_id(), "99.1");
        assert_eq!(channel.env().caller_number(), "+306911111111");
    }

    #[tokio::test]
    async fn read_dtmf_returns_the_variable_payload() {
        let mut channel = channel_with("200 result=1\n200 result=1 (4)\n").await;
        let digits = channel.read_dtmf("welcome", 1, 10).await.unwrap();
        assert_eq!(digits, "4");
        let sent = String::from_utf8(channel.writer.clone()).unwrap();
        assert!(sent.contains("EXEC Read \"AGENT_CHOICE,welcome,1,,1,10\""));
        assert!(sent.contains("GET VARIABLE AGENT_CHOICE"));
    }

    #[tokio::test]
    async fn unset_variable_reads_as_empty() {
        let mut channel = channel_with("200 result=1\n200 result=0\n").await;
        let digits = channel.read_dtmf("welcome", 1, 10).await.unwrap();
        assert_eq!(digits, "");
    }

    #[tokio::test]
    async fn dead_probe_reports_not_alive() {
        let mut channel = channel_with("200 result=0\n").await;
        assert!(!channel.channel_alive().await.unwrap());
        let mut channel = channel_with("200 result=6\n").await;
        assert!(channel.channel_alive().await.unwrap());
    }

    #[tokio::test]
    async fn hangup_marker_mid_command_is_terminal() {
        let mut channel = channel_with("HANGUP\n").await;
        let err = channel.play("welcome").await.unwrap_err();
        assert!(err.is_hangup());
    }

    #[tokio::test]
    async fn closed_stream_is_a_hangup() {
        let mut channel = channel_with("").await;
        let err = channel.play("welcome").await.unwrap_err();
        assert!(err.is_hangup());
    }

    #[tokio::test]
    async fn intentional_hangup_tolerates_closed_stream() {
        let mut channel = channel_with("").await;
        assert!(channel.hangup().await.is_ok());
    }
}
