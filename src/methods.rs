//! Static table of well-known remote methods.
//!
//! The table is read-only seed data for the [`MethodRegistry`]: each entry
//! names a method, its input/output message types, the owning plugin, and
//! an optional reserved wire id. Only `BindMethod` (0) and `RunCommand` (1)
//! carry reserved ids; everything else is resolved at runtime through the
//! bind protocol.
//!
//! [`MethodRegistry`]: crate::registry::MethodRegistry

/// Method name used to resolve other methods to wire ids.
pub const BIND_METHOD: &str = "BindMethod";

/// Method name used to run console commands remotely.
pub const RUN_COMMAND: &str = "RunCommand";

/// One row of the seed table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDecl {
    /// Method name, unique key.
    pub method: String,
    /// Full input message type name.
    pub input: String,
    /// Full output message type name.
    pub output: String,
    /// Owning plugin, if any.
    pub plugin: Option<String>,
    /// Protocol-reserved wire id, if any.
    pub reserved_id: Option<i16>,
}

/// Immutable seed table passed to the registry at construction.
#[derive(Debug, Clone, Default)]
pub struct MethodTable {
    entries: Vec<MethodDecl>,
}

impl MethodTable {
    /// Create an empty table. The bind protocol still requires the two
    /// reserved entries, so prefer starting from [`MethodTable::core`].
    pub fn empty() -> Self {
        Self::default()
    }

    /// The well-known method table for a stock DFHack server.
    pub fn core() -> Self {
        let entries = CORE_METHODS
            .iter()
            .map(|&(method, input, output, plugin, reserved_id)| MethodDecl {
                method: method.to_string(),
                input: input.to_string(),
                output: output.to_string(),
                plugin: plugin.map(str::to_string),
                reserved_id,
            })
            .collect();
        Self { entries }
    }

    /// Add a custom method declaration.
    pub fn with_method(
        mut self,
        method: &str,
        input: &str,
        output: &str,
        plugin: Option<&str>,
    ) -> Self {
        self.entries.push(MethodDecl {
            method: method.to_string(),
            input: input.to_string(),
            output: output.to_string(),
            plugin: plugin.map(str::to_string),
            reserved_id: None,
        });
        self
    }

    /// All declarations in table order.
    pub fn entries(&self) -> &[MethodDecl] {
        &self.entries
    }

    /// Iterator over every input/output type name in the table.
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .flat_map(|e| [e.input.as_str(), e.output.as_str()])
    }
}

/// (method, input type, output type, plugin, reserved id)
const CORE_METHODS: &[(&str, &str, &str, Option<&str>, Option<i16>)] = &[
    // dfhack/library/proto/CoreProtocol.proto
    ("BindMethod", "dfproto.CoreBindRequest", "dfproto.CoreBindReply", None, Some(0)),
    ("RunCommand", "dfproto.CoreRunCommandRequest", "dfproto.EmptyMessage", None, Some(1)),
    ("CoreSuspend", "dfproto.EmptyMessage", "dfproto.IntMessage", None, None),
    ("CoreResume", "dfproto.EmptyMessage", "dfproto.IntMessage", None, None),
    ("RunLua", "dfproto.CoreRunLuaRequest", "dfproto.StringListMessage", None, None),
    // dfhack/library/proto/BasicApi.proto
    ("GetVersion", "dfproto.EmptyMessage", "dfproto.StringMessage", None, None),
    ("GetDFVersion", "dfproto.EmptyMessage", "dfproto.StringMessage", None, None),
    ("GetWorldInfo", "dfproto.EmptyMessage", "dfproto.GetWorldInfoOut", None, None),
    ("ListEnums", "dfproto.EmptyMessage", "dfproto.ListEnumsOut", None, None),
    ("ListJobSkills", "dfproto.EmptyMessage", "dfproto.ListJobSkillsOut", None, None),
    ("ListMaterials", "dfproto.ListMaterialsIn", "dfproto.ListMaterialsOut", None, None),
    ("ListUnits", "dfproto.ListUnitsIn", "dfproto.ListUnitsOut", None, None),
    ("ListSquads", "dfproto.ListSquadsIn", "dfproto.ListSquadsOut", None, None),
    ("SetUnitLabors", "dfproto.SetUnitLaborsIn", "dfproto.EmptyMessage", None, None),
    // dfhack/plugins/proto/rename.proto
    ("RenameSquad", "dfproto.RenameSquadIn", "dfproto.EmptyMessage", Some("rename"), None),
    ("RenameUnit", "dfproto.RenameUnitIn", "dfproto.EmptyMessage", Some("rename"), None),
    ("RenameBuilding", "dfproto.RenameBuildingIn", "dfproto.EmptyMessage", Some("rename"), None),
    // dfhack/plugins/proto/isoworldremote.proto
    ("GetEmbarkTile", "isoworldremote.TileRequest", "isoworldremote.EmbarkTile", Some("isoworldremote"), None),
    ("GetEmbarkInfo", "isoworldremote.MapRequest", "isoworldremote.MapReply", Some("isoworldremote"), None),
    ("GetRawNames", "isoworldremote.MapRequest", "isoworldremote.RawNames", Some("isoworldremote"), None),
    // dfhack/plugins/proto/RemoteFortressReader.proto
    ("GetMaterialList", "dfproto.EmptyMessage", "RemoteFortressReader.MaterialList", Some("RemoteFortressReader"), None),
    ("GetGrowthList", "dfproto.EmptyMessage", "RemoteFortressReader.MaterialList", Some("RemoteFortressReader"), None),
    ("GetBlockList", "RemoteFortressReader.BlockRequest", "RemoteFortressReader.BlockList", Some("RemoteFortressReader"), None),
    ("CheckHashes", "dfproto.EmptyMessage", "dfproto.EmptyMessage", Some("RemoteFortressReader"), None),
    ("GetTiletypeList", "dfproto.EmptyMessage", "RemoteFortressReader.TiletypeList", Some("RemoteFortressReader"), None),
    ("GetPlantList", "RemoteFortressReader.BlockRequest", "RemoteFortressReader.PlantList", Some("RemoteFortressReader"), None),
    ("GetUnitList", "dfproto.EmptyMessage", "RemoteFortressReader.UnitList", Some("RemoteFortressReader"), None),
    ("GetUnitListInside", "RemoteFortressReader.BlockRequest", "RemoteFortressReader.UnitList", Some("RemoteFortressReader"), None),
    ("GetViewInfo", "dfproto.EmptyMessage", "RemoteFortressReader.ViewInfo", Some("RemoteFortressReader"), None),
    ("GetMapInfo", "dfproto.EmptyMessage", "RemoteFortressReader.MapInfo", Some("RemoteFortressReader"), None),
    ("ResetMapHashes", "dfproto.EmptyMessage", "dfproto.EmptyMessage", Some("RemoteFortressReader"), None),
    ("GetItemList", "dfproto.EmptyMessage", "RemoteFortressReader.MaterialList", Some("RemoteFortressReader"), None),
    ("GetBuildingDefList", "dfproto.EmptyMessage", "RemoteFortressReader.BuildingList", Some("RemoteFortressReader"), None),
    ("GetWorldMap", "dfproto.EmptyMessage", "RemoteFortressReader.WorldMap", Some("RemoteFortressReader"), None),
    ("GetWorldMapNew", "dfproto.EmptyMessage", "RemoteFortressReader.WorldMap", Some("RemoteFortressReader"), None),
    ("GetRegionMaps", "dfproto.EmptyMessage", "RemoteFortressReader.RegionMaps", Some("RemoteFortressReader"), None),
    ("GetRegionMapsNew", "dfproto.EmptyMessage", "RemoteFortressReader.RegionMaps", Some("RemoteFortressReader"), None),
    ("GetCreatureRaws", "dfproto.EmptyMessage", "RemoteFortressReader.CreatureRawList", Some("RemoteFortressReader"), None),
    ("GetPartialCreatureRaws", "RemoteFortressReader.ListRequest", "RemoteFortressReader.CreatureRawList", Some("RemoteFortressReader"), None),
    ("GetWorldMapCenter", "dfproto.EmptyMessage", "RemoteFortressReader.WorldMap", Some("RemoteFortressReader"), None),
    ("GetPlantRaws", "dfproto.EmptyMessage", "RemoteFortressReader.PlantRawList", Some("RemoteFortressReader"), None),
    ("GetPartialPlantRaws", "RemoteFortressReader.ListRequest", "RemoteFortressReader.PlantRawList", Some("RemoteFortressReader"), None),
    ("CopyScreen", "dfproto.EmptyMessage", "RemoteFortressReader.ScreenCapture", Some("RemoteFortressReader"), None),
    ("PassKeyboardEvent", "RemoteFortressReader.KeyboardEvent", "dfproto.EmptyMessage", Some("RemoteFortressReader"), None),
    ("SendDigCommand", "RemoteFortressReader.DigCommand", "dfproto.EmptyMessage", Some("RemoteFortressReader"), None),
    ("SetPauseState", "RemoteFortressReader.SingleBool", "dfproto.EmptyMessage", Some("RemoteFortressReader"), None),
    ("GetPauseState", "dfproto.EmptyMessage", "RemoteFortressReader.SingleBool", Some("RemoteFortressReader"), None),
    ("GetVersionInfo", "dfproto.EmptyMessage", "RemoteFortressReader.VersionInfo", Some("RemoteFortressReader"), None),
    ("GetReports", "dfproto.EmptyMessage", "RemoteFortressReader.Status", Some("RemoteFortressReader"), None),
    ("MoveCommand", "AdventureControl.MoveCommandParams", "dfproto.EmptyMessage", Some("RemoteFortressReader"), None),
    ("JumpCommand", "AdventureControl.MoveCommandParams", "dfproto.EmptyMessage", Some("RemoteFortressReader"), None),
    ("MenuQuery", "dfproto.EmptyMessage", "AdventureControl.MenuContents", Some("RemoteFortressReader"), None),
    ("MovementSelectCommand", "dfproto.IntMessage", "dfproto.EmptyMessage", Some("RemoteFortressReader"), None),
    ("MiscMoveCommand", "AdventureControl.MiscMoveParams", "dfproto.EmptyMessage", Some("RemoteFortressReader"), None),
    ("GetLanguage", "dfproto.EmptyMessage", "RemoteFortressReader.Language", Some("RemoteFortressReader"), None),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_table_reserved_ids() {
        let table = MethodTable::core();
        let bind = table.entries().iter().find(|e| e.method == BIND_METHOD).unwrap();
        assert_eq!(bind.reserved_id, Some(0));
        assert_eq!(bind.input, "dfproto.CoreBindRequest");

        let run = table.entries().iter().find(|e| e.method == RUN_COMMAND).unwrap();
        assert_eq!(run.reserved_id, Some(1));

        let reserved: Vec<_> = table
            .entries()
            .iter()
            .filter(|e| e.reserved_id.is_some())
            .collect();
        assert_eq!(reserved.len(), 2);
    }

    #[test]
    fn test_core_table_unique_names() {
        let table = MethodTable::core();
        let mut names: Vec<_> = table.entries().iter().map(|e| e.method.as_str()).collect();
        let total = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), total);
    }

    #[test]
    fn test_with_method_adds_unreserved_entry() {
        let table = MethodTable::empty().with_method(
            "GetThing",
            "myplugin.ThingIn",
            "myplugin.ThingOut",
            Some("myplugin"),
        );

        let entry = &table.entries()[0];
        assert_eq!(entry.method, "GetThing");
        assert_eq!(entry.plugin.as_deref(), Some("myplugin"));
        assert_eq!(entry.reserved_id, None);
    }

    #[test]
    fn test_type_names_cover_inputs_and_outputs() {
        let table = MethodTable::core();
        let names: Vec<_> = table.type_names().collect();
        assert!(names.contains(&"dfproto.CoreBindRequest"));
        assert!(names.contains(&"dfproto.StringMessage"));
        assert!(names.contains(&"RemoteFortressReader.WorldMap"));
    }
}
