//! Error types for vfxe.
//!
//! Nothing in the frame loop is fatal. Engine errors are reported to the
//! caller (or logged by [`Registry::dispatch`](crate::registry::Registry::dispatch))
//! and the affected effect simply keeps its previous state.

use std::fmt;

/// Errors raised by the effect engine itself.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    /// No effect with this name is registered.
    UnknownEffect(String),
    /// The effect exists but has no parameter with this name.
    UnknownParameter {
        /// Effect that was addressed.
        effect: String,
        /// Parameter that was requested.
        param: String,
    },
    /// The effect was already destroyed.
    Destroyed(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::UnknownEffect(name) => write!(f, "Unknown effect '{}'", name),
            EngineError::UnknownParameter { effect, param } => {
                write!(f, "Effect '{}' has no parameter '{}'", effect, param)
            }
            EngineError::Destroyed(name) => write!(f, "Effect '{}' was already destroyed", name),
        }
    }
}

impl std::error::Error for EngineError {}

/// Errors that can occur while bringing up or driving a renderer.
#[derive(Debug)]
pub enum RenderError {
    /// Failed to create a surface for rendering.
    SurfaceCreation(wgpu::CreateSurfaceError),
    /// No compatible GPU adapter found.
    NoAdapter,
    /// Failed to create GPU device.
    DeviceCreation(wgpu::RequestDeviceError),
    /// Acquiring or presenting a frame failed.
    Surface(wgpu::SurfaceError),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::SurfaceCreation(e) => write!(f, "Failed to create GPU surface: {}", e),
            RenderError::NoAdapter => write!(f, "No compatible GPU adapter found. Ensure your system has a GPU with WebGPU/Vulkan/Metal/DX12 support."),
            RenderError::DeviceCreation(e) => write!(f, "Failed to create GPU device: {}", e),
            RenderError::Surface(e) => write!(f, "Surface error: {}", e),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::SurfaceCreation(e) => Some(e),
            RenderError::DeviceCreation(e) => Some(e),
            RenderError::Surface(e) => Some(e),
            RenderError::NoAdapter => None,
        }
    }
}

impl From<wgpu::CreateSurfaceError> for RenderError {
    fn from(e: wgpu::CreateSurfaceError) -> Self {
        RenderError::SurfaceCreation(e)
    }
}

impl From<wgpu::RequestDeviceError> for RenderError {
    fn from(e: wgpu::RequestDeviceError) -> Self {
        RenderError::DeviceCreation(e)
    }
}

impl From<wgpu::SurfaceError> for RenderError {
    fn from(e: wgpu::SurfaceError) -> Self {
        RenderError::Surface(e)
    }
}

/// Errors that can occur while writing a CPU snapshot.
#[derive(Debug)]
pub enum SnapshotError {
    /// Failed to encode the image.
    Image(image::ImageError),
    /// Failed to write the file.
    Io(std::io::Error),
    /// The named effect has no CPU reference renderer.
    Unsupported(String),
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotError::Image(e) => write!(f, "Failed to encode image: {}", e),
            SnapshotError::Io(e) => write!(f, "Failed to write snapshot: {}", e),
            SnapshotError::Unsupported(name) => {
                write!(f, "Effect '{}' has no CPU snapshot renderer", name)
            }
        }
    }
}

impl std::error::Error for SnapshotError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SnapshotError::Image(e) => Some(e),
            SnapshotError::Io(e) => Some(e),
            SnapshotError::Unsupported(_) => None,
        }
    }
}

impl From<image::ImageError> for SnapshotError {
    fn from(e: image::ImageError) -> Self {
        SnapshotError::Image(e)
    }
}

impl From<std::io::Error> for SnapshotError {
    fn from(e: std::io::Error) -> Self {
        SnapshotError::Io(e)
    }
}

/// Errors that can occur while loading the application config file.
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read the file from disk.
    Io(std::io::Error),
    /// The file is not valid config JSON.
    Parse(serde_json::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "Failed to read config file: {}", e),
            ConfigError::Parse(e) => write!(f, "Failed to parse config file: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e)
    }
}

/// Errors that can occur when running the application.
#[derive(Debug)]
pub enum AppError {
    /// Failed to create or run the event loop.
    EventLoop(winit::error::EventLoopError),
    /// The config file passed on the command line could not be loaded.
    Config(ConfigError),
    /// Snapshot rendering failed.
    Snapshot(SnapshotError),
    /// Command line arguments could not be understood.
    Args(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::EventLoop(e) => write!(f, "Event loop error: {}", e),
            AppError::Config(e) => write!(f, "Config error: {}", e),
            AppError::Snapshot(e) => write!(f, "Snapshot error: {}", e),
            AppError::Args(msg) => write!(f, "Invalid arguments: {}", msg),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::EventLoop(e) => Some(e),
            AppError::Config(e) => Some(e),
            AppError::Snapshot(e) => Some(e),
            AppError::Args(_) => None,
        }
    }
}

impl From<winit::error::EventLoopError> for AppError {
    fn from(e: winit::error::EventLoopError) -> Self {
        AppError::EventLoop(e)
    }
}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        AppError::Config(e)
    }
}

impl From<SnapshotError> for AppError {
    fn from(e: SnapshotError) -> Self {
        AppError::Snapshot(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_error_display() {
        let err = EngineError::UnknownEffect("sparkles".into());
        assert_eq!(err.to_string(), "Unknown effect 'sparkles'");

        let err = EngineError::UnknownParameter {
            effect: "fluid".into(),
            param: "viscosity".into(),
        };
        assert!(err.to_string().contains("viscosity"));
    }

    #[test]
    fn test_snapshot_error_source() {
        use std::error::Error;
        let err = SnapshotError::from(std::io::Error::new(std::io::ErrorKind::Other, "disk"));
        assert!(err.source().is_some());
        assert!(SnapshotError::Unsupported("fluid".into()).source().is_none());
    }
}
