//! Blocking client for the Minecraft: Pi Edition API
//!
//! The API is line based: each command is `name(arg,arg,...)\n`. Queries such as
//! `player.getTile()` get a single reply line; `world.setBlock` gets none.

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::registry::Block;
use crate::world::{TilePos, World, WorldError};

/// Port the Pi API listens on by default.
pub const DEFAULT_PORT: u16 = 4711;

/// A connected Pi API session.
#[derive(Debug)]
pub struct PiConnection {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
}

impl PiConnection {
    /// Connect to `host:port`, optionally bounding reads and writes.
    pub fn connect(host: &str, port: u16, timeout: Option<Duration>) -> Result<Self, WorldError> {
        let mut last_err = None;
        for addr in (host, port).to_socket_addrs()? {
            let attempt = match timeout {
                Some(t) => TcpStream::connect_timeout(&addr, t),
                None => TcpStream::connect(addr),
            };
            match attempt {
                Ok(stream) => {
                    tracing::info!(%addr, "connected to world");
                    return Self::from_stream(stream, timeout);
                }
                Err(e) => last_err = Some(e),
            }
        }
        Err(last_err
            .map(WorldError::Connection)
            .unwrap_or_else(|| WorldError::Protocol(format!("no address found for {}", host))))
    }

    /// Wrap an already-connected stream.
    pub fn from_stream(stream: TcpStream, timeout: Option<Duration>) -> Result<Self, WorldError> {
        stream.set_nodelay(true)?;
        stream.set_read_timeout(timeout)?;
        stream.set_write_timeout(timeout)?;
        let writer = stream.try_clone()?;
        Ok(Self { reader: BufReader::new(stream), writer })
    }

    fn send(&mut self, command: &str) -> Result<(), WorldError> {
        self.writer.write_all(command.as_bytes())?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    fn query(&mut self, command: &str) -> Result<String, WorldError> {
        self.send(command)?;
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Err(WorldError::Protocol(format!("connection closed while waiting for {}", command)));
        }
        Ok(line.trim_end().to_string())
    }
}

/// Parse an `x,y,z` reply.
pub fn parse_tile_pos(reply: &str) -> Result<TilePos, WorldError> {
    let parts: Vec<&str> = reply.split(',').map(str::trim).collect();
    let coords = match parts.as_slice() {
        [x, y, z] => (x.parse::<i32>(), y.parse::<i32>(), z.parse::<i32>()),
        _ => return Err(WorldError::Protocol(format!("expected x,y,z but got '{}'", reply))),
    };
    match coords {
        (Ok(x), Ok(y), Ok(z)) => Ok(TilePos::new(x, y, z)),
        _ => Err(WorldError::Protocol(format!("expected integer coordinates but got '{}'", reply))),
    }
}

/// Format a `world.setBlock` command line (without the newline).
pub fn set_block_command(pos: TilePos, block: Block) -> String {
    format!(
        "world.setBlock({},{},{},{},{})",
        pos.x, pos.y, pos.z, block.block_type, block.variant
    )
}

impl World for PiConnection {
    fn tile_pos(&mut self) -> Result<TilePos, WorldError> {
        let reply = self.query("player.getTile()")?;
        parse_tile_pos(&reply)
    }

    fn set_block(&mut self, pos: TilePos, block: Block) -> Result<(), WorldError> {
        self.send(&set_block_command(pos, block))
    }
}
