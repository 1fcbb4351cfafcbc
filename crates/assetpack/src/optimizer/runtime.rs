use assetpack_ecmascript::js_string;

/// Installs the loader before any module. Modules follow at the top level of
/// the script, so the only globals added here are the five declared below.
pub const RUNTIME: &str = r#"var define, require, amdLookup, amdInit, amdStart;
(function (global) {
  var definitions = Object.create(null);
  var modules = Object.create(null);
  var queue = [];
  var ready = false;

  function isArray(value) {
    return Object.prototype.toString.call(value) === "[object Array]";
  }

  define = function (name, deps, factory) {
    if (typeof name !== "string") {
      throw new Error("Anonymous define() in an optimized bundle");
    }
    if (!isArray(deps)) {
      factory = deps;
      deps = typeof factory === "function" && factory.length ? ["require", "exports", "module"] : [];
    }
    if (!(name in definitions)) {
      definitions[name] = { deps: deps, factory: factory };
    }
  };
  define.amd = {};

  require = function (deps, callback) {
    if (typeof deps === "string") {
      return load(deps);
    }
    if (ready) {
      invoke(deps, callback, null);
    } else {
      queue.push([deps, callback]);
    }
    return undefined;
  };

  amdLookup = function (path) {
    var value = global;
    var parts = path.split(".");
    for (var i = 0; i < parts.length && value != null; i++) {
      value = value[parts[i]];
    }
    return value;
  };

  function assign(path, value) {
    var target = global;
    var parts = path.split(".");
    for (var i = 0; i < parts.length - 1; i++) {
      if (target[parts[i]] == null) {
        target[parts[i]] = {};
      }
      target = target[parts[i]];
    }
    target[parts[parts.length - 1]] = value;
  }

  amdInit = function (description) {
    var assignments = description.assign || [];
    for (var i = 0; i < assignments.length; i++) {
      assign(assignments[i].path, assignments[i].value);
    }
    return description.returns ? amdLookup(description.returns) : undefined;
  };

  function normalize(name, base) {
    var bang = name.indexOf("!");
    if (bang !== -1) {
      return name.slice(0, bang + 1) + normalize(name.slice(bang + 1), base);
    }
    if (name.charAt(0) !== "." || !base) {
      return name;
    }
    var parts = base.split("/");
    parts.pop();
    var segments = name.split("/");
    for (var i = 0; i < segments.length; i++) {
      if (segments[i] === "..") {
        parts.pop();
      } else if (segments[i] !== ".") {
        parts.push(segments[i]);
      }
    }
    return parts.join("/");
  }

  function load(name) {
    var module = modules[name];
    if (module) {
      if (!module.loaded) {
        throw new Error("Module \"" + name + "\" is required while it is still loading");
      }
      return module.exports;
    }
    var definition = definitions[name];
    if (!definition) {
      throw new Error("Module \"" + name + "\" is not defined");
    }
    module = modules[name] = { id: name, exports: {}, loaded: false };
    var value = typeof definition.factory === "function"
      ? invoke(definition.deps, definition.factory, module)
      : definition.factory;
    if (value !== undefined) {
      module.exports = value;
    }
    module.loaded = true;
    return module.exports;
  }

  function localRequire(base) {
    return function (deps, callback) {
      if (typeof deps === "string") {
        return load(normalize(deps, base));
      }
      var names = [];
      for (var i = 0; i < deps.length; i++) {
        names.push(normalize(deps[i], base));
      }
      return require(names, callback);
    };
  }

  function resolve(dep, module) {
    if (dep === "require") {
      return module ? localRequire(module.id) : require;
    }
    if (module && dep === "exports") {
      return module.exports;
    }
    if (module && dep === "module") {
      return module;
    }
    return load(module ? normalize(dep, module.id) : dep);
  }

  function invoke(deps, callback, module) {
    var args = [];
    for (var i = 0; i < deps.length; i++) {
      args.push(resolve(deps[i], module));
    }
    return callback ? callback.apply(module ? module.exports : global, args) : undefined;
  }

  amdStart = function (entry) {
    load(entry);
    ready = true;
    while (queue.length) {
      var pending = queue.shift();
      invoke(pending[0], pending[1], null);
    }
  };
})(this);
"#;

/// Runs the entry module once, then every `require([...])` queued while the
/// modules were being registered.
pub fn start(entry: &str) -> String {
  format!("\namdStart({});\n", js_string(entry))
}
