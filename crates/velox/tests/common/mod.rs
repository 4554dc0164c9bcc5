//! Shared helpers for integration tests

#![allow(dead_code)]

use parking_lot::Mutex;
use velox::{
    EvalContext, Extension, Frontend, InterpreterError, Interpreter, Item, LogRecorder,
    LoggingExtension, NativeFunction, ObjectType, Program, RegistrationError, Scope,
    VeloxFrontend,
};

/// Packed RGBA value of the `Red` constant.
pub const RED: i64 = 0xFF00_00FF;

/// Pixel storage attached to `Image` instances.
#[derive(Debug)]
pub struct ImageData {
    pub width: i64,
    pub height: i64,
    pub pixels: Mutex<Vec<i64>>,
}

impl ImageData {
    fn offset(&self, x: i64, y: i64, function: &str) -> Result<usize, InterpreterError> {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return Err(InterpreterError::native(
                function,
                format!("pixel ({}, {}) outside {}x{} image", x, y, self.width, self.height),
            ));
        }
        Ok((y * self.width + x) as usize)
    }
}

fn image_of(scope: &Scope, function: &str) -> Result<std::sync::Arc<ImageData>, InterpreterError> {
    scope
        .resolve("this")?
        .foreign::<ImageData>()
        .ok_or_else(|| InterpreterError::native(function, "first argument must be of type Image"))
}

/// In-memory image binding: an `Image(width, height)` object type with
/// `SetPixel` / `GetPixel` members and a `Red` constant.
#[derive(Debug, Default)]
pub struct ImageExtension;

impl Extension for ImageExtension {
    fn name(&self) -> &str {
        "Image"
    }

    fn inject(&self, interp: &mut Interpreter) -> Result<(), RegistrationError> {
        let ty = ObjectType::new("Image")
            .with_native_constructor(NativeFunction::new("Image", &["width", "height"], |scope, _| {
                let width = scope.resolve("width")?.get_integer_value()?;
                let height = scope.resolve("height")?.get_integer_value()?;
                if width <= 0 || height <= 0 {
                    return Err(InterpreterError::native("Image", "dimensions must be positive"));
                }
                scope.resolve("this")?.set_foreign(ImageData {
                    width,
                    height,
                    pixels: Mutex::new(vec![0; (width * height) as usize]),
                });
                Ok(Item::undefined())
            }))
            .with_native_method(NativeFunction::new("SetPixel", &["x", "y", "color"], |scope, _| {
                let image = image_of(scope, "SetPixel")?;
                let x = scope.resolve("x")?.get_integer_value()?;
                let y = scope.resolve("y")?.get_integer_value()?;
                let color = scope.resolve("color")?.get_integer_value()?;
                let offset = image.offset(x, y, "SetPixel")?;
                image.pixels.lock()[offset] = color;
                Ok(Item::undefined())
            }))
            .with_native_method(NativeFunction::new("GetPixel", &["x", "y"], |scope, _| {
                let image = image_of(scope, "GetPixel")?;
                let x = scope.resolve("x")?.get_integer_value()?;
                let y = scope.resolve("y")?.get_integer_value()?;
                let offset = image.offset(x, y, "GetPixel")?;
                let color = image.pixels.lock()[offset];
                Ok(Item::integer(color))
            }));
        interp.add_object_type(ty)?;
        interp.add_global_constant("Red", Item::integer(RED));
        interp.add_global_function(NativeFunction::new("Defined", &["name"], |scope, _| {
            let name = scope.resolve("name")?.get_string_value()?;
            Ok(Item::boolean(scope.lookup(&name).is_some()))
        }))?;
        Ok(())
    }
}

/// Parse with the bundled frontend, panicking on syntax errors.
pub fn parse(source: &str) -> Program {
    VeloxFrontend::new()
        .parse_str("test.vx", source)
        .unwrap_or_else(|e| panic!("{}", e))
}

/// Run `source` in a fresh interpreter.
pub fn run(source: &str) -> Result<Item, InterpreterError> {
    Interpreter::new().execute(&parse(source))
}

/// Run `source` and render the result.
pub fn run_display(source: &str) -> String {
    run(source)
        .unwrap_or_else(|e| panic!("script failed: {}", e))
        .to_string()
}

/// Run `source` expecting an error.
pub fn run_err(source: &str) -> InterpreterError {
    match run(source) {
        Ok(item) => panic!("expected an error, got {:?}", item),
        Err(e) => e,
    }
}

/// Interpreter with logging (recorded) and the image binding injected.
pub fn host_interpreter(context: EvalContext) -> (Interpreter, LogRecorder) {
    let recorder = LogRecorder::new();
    let mut interp = Interpreter::with_context(context);
    LoggingExtension::with_recorder(recorder.clone())
        .inject(&mut interp)
        .unwrap();
    ImageExtension.inject(&mut interp).unwrap();
    (interp, recorder)
}

/// Run `source` on a host interpreter, returning the logged messages.
pub fn run_logged(source: &str) -> Result<Vec<String>, InterpreterError> {
    let (mut interp, recorder) = host_interpreter(EvalContext::default());
    interp.execute(&parse(source))?;
    Ok(recorder.messages())
}
