//! Stable element and attribute names of the configurations.xml format.
//! These names are the interoperability contract across every format
//! version and must never change.

pub const CONFIGURATION_DESCRIPTOR_ELEMENT: &str = "configurationDescriptor";
pub const VERSION_ATTR: &str = "version";

pub const LOGICAL_FOLDER_ELEMENT: &str = "logicalFolder";
pub const DISK_FOLDER_ELEMENT: &str = "df";
pub const ITEM_PATH_ELEMENT: &str = "itemPath";
pub const DISK_FILE_ELEMENT: &str = "in";
pub const NAME_ATTR: &str = "name";
pub const DISPLAY_NAME_ATTR: &str = "displayName";
pub const PROJECT_FILES_ATTR: &str = "projectFiles";
pub const KIND_ATTR: &str = "kind";
pub const ROOT_ATTR: &str = "root";

pub const FOLDER_KIND_ROOT: &str = "ROOT";
pub const FOLDER_KIND_SOURCE: &str = "SOURCE_LOGICAL_FOLDER";
pub const FOLDER_KIND_TEST: &str = "TEST_LOGICAL_FOLDER";

pub const SOURCE_ROOT_LIST_ELEMENT: &str = "sourceRootList";
pub const TEST_ROOT_LIST_ELEMENT: &str = "testRootList";
pub const LIST_ELEMENT: &str = "Elem";

pub const PROJECT_MAKEFILE_ELEMENT: &str = "projectmakefile";

pub const CONFS_ELEMENT: &str = "confs";
pub const CONF_ELEMENT: &str = "conf";
pub const TYPE_ATTR: &str = "type";

pub const TOOLS_SET_ELEMENT: &str = "toolsSet";
pub const COMPILER_SET_ELEMENT: &str = "compilerSet";
pub const DEPENDENCY_CHECKING_ELEMENT: &str = "dependencyChecking";
pub const REBUILD_PROP_CHANGED_ELEMENT: &str = "rebuildPropChanged";
pub const C_REQUIRED_ELEMENT: &str = "cRequired";
pub const CPP_REQUIRED_ELEMENT: &str = "cppRequired";
pub const FORTRAN_REQUIRED_ELEMENT: &str = "fortranRequired";
pub const ASSEMBLER_REQUIRED_ELEMENT: &str = "asmRequired";

pub const COMPILE_TYPE_ELEMENT: &str = "compileType";
pub const MAKEFILE_TYPE_ELEMENT: &str = "makefileType";
pub const MAKETOOL_ELEMENT: &str = "makeTool";
pub const BUILD_COMMAND_WORKING_DIR_ELEMENT: &str = "buildCommandWorkingDir";
pub const BUILD_COMMAND_ELEMENT: &str = "buildCommand";
pub const CLEAN_COMMAND_ELEMENT: &str = "cleanCommand";
pub const EXECUTABLE_PATH_ELEMENT: &str = "executablePath";

pub const C_COMPILER_TOOL_ELEMENT: &str = "cTool";
pub const CPP_COMPILER_TOOL_ELEMENT: &str = "ccTool";
pub const FORTRAN_COMPILER_TOOL_ELEMENT: &str = "fortranCompilerTool";
pub const ASSEMBLER_TOOL_ELEMENT: &str = "assemblerTool";
pub const LINKER_TOOL_ELEMENT: &str = "linkerTool";
pub const ARCHIVER_TOOL_ELEMENT: &str = "archiverTool";
pub const CUSTOM_TOOL_ELEMENT: &str = "customTool";

pub const DEVELOPMENT_MODE_ELEMENT: &str = "developmentMode";
pub const WARNING_LEVEL_ELEMENT: &str = "warningLevel";
pub const STANDARD_ELEMENT: &str = "standard";
pub const STRIP_ELEMENT: &str = "strip";
pub const COMMAND_LINE_ELEMENT: &str = "commandLine";
pub const TOOL_ELEMENT: &str = "tool";
pub const PREPROCESSOR_LIST_ELEMENT: &str = "preprocessorList";
pub const INCLUDE_DIRECTORIES_ELEMENT: &str = "incDir";
pub const INCLUDE_FILES_ELEMENT: &str = "incFile";
pub const DIRECTORY_PATH_ELEMENT: &str = "pElem";

pub const IMPORTANT_FLAGS_ELEMENT: &str = "importantFlags";
pub const FLAGS_DICTIONARY_ELEMENT: &str = "flagsDictionary";
pub const DICTIONARY_ELEMENT: &str = "element";
pub const FLAGS_ID_ATTR: &str = "flagsID";
pub const COMMON_FLAGS_ATTR: &str = "commonFlags";
pub const FLAGS_ATTR: &str = "flags";

pub const OUTPUT_ELEMENT: &str = "output";
pub const LINKER_ADD_LIB_ELEMENT: &str = "linkerAddLib";
// Historical misspelling, part of the wire format.
pub const LINKER_DYN_SEARCH_ELEMENT: &str = "linkerDynSerch";
pub const LINKER_LIB_ITEMS_ELEMENT: &str = "linkerLibItems";
pub const LINKER_LIB_PROJECT_ITEM_ELEMENT: &str = "linkerLibProjectItem";
pub const LINKER_LIB_STDLIB_ITEM_ELEMENT: &str = "linkerLibStdlibItem";
pub const LINKER_LIB_LIB_ITEM_ELEMENT: &str = "linkerLibLibItem";
pub const LINKER_LIB_FILE_ITEM_ELEMENT: &str = "linkerLibFileItem";
pub const LINKER_OPTION_ITEM_ELEMENT: &str = "linkerOptionItem";
pub const LINKER_PIC_ELEMENT: &str = "picMode";
pub const OPTION_ATTR: &str = "option";

pub const MAKE_ARTIFACT_ELEMENT: &str = "makeArtifact";
pub const MAKE_ARTIFACT_PL_ATTR: &str = "PL";
pub const MAKE_ARTIFACT_CT_ATTR: &str = "CT";
pub const MAKE_ARTIFACT_CN_ATTR: &str = "CN";
pub const MAKE_ARTIFACT_AC_ATTR: &str = "AC";
pub const MAKE_ARTIFACT_BL_ATTR: &str = "BL";
pub const MAKE_ARTIFACT_WD_ATTR: &str = "WD";
pub const MAKE_ARTIFACT_BC_ATTR: &str = "BC";
pub const MAKE_ARTIFACT_CC_ATTR: &str = "CC";
pub const MAKE_ARTIFACT_OP_ATTR: &str = "OP";

pub const REQUIRED_PROJECTS_ELEMENT: &str = "requiredProjects";

pub const ARCHIVER_RUN_RANLIB_ELEMENT: &str = "runRanlib";
pub const VERBOSE_ELEMENT: &str = "verbose";

pub const PACKAGING_ELEMENT: &str = "packaging";
pub const PACK_TYPE_ELEMENT: &str = "packType";
pub const PACK_OUTPUT_ELEMENT: &str = "packOutput";
pub const PACK_TOOL_ELEMENT: &str = "packTool";
pub const PACK_OPTIONS_ELEMENT: &str = "packOptions";
pub const PACK_TOP_DIR_ELEMENT: &str = "packTopDir";
pub const PACK_FILE_LIST_ELEMENT: &str = "packFileList";
pub const PACK_FILE_LIST_ITEM_ELEMENT: &str = "packFileListElem";
pub const PACK_ADDITIONAL_INFO_ELEMENT: &str = "packAdditionalInfo";
pub const PACK_FILE_TYPE_ATTR: &str = "type";
pub const PACK_FILE_TO_ATTR: &str = "to";
pub const PACK_FILE_FROM_ATTR: &str = "from";
pub const PACK_FILE_PERM_ATTR: &str = "perm";
pub const PACK_FILE_OWNER_ATTR: &str = "owner";
pub const PACK_FILE_GROUP_ATTR: &str = "group";

pub const ITEM_ELEMENT: &str = "item";
pub const PATH_ATTR: &str = "path";
pub const EXCLUDED_ATTR: &str = "ex";
pub const ITEM_TOOL_ATTR: &str = "tool";
pub const ITEM_FLAVOR_ATTR: &str = "flavor2";
pub const FOLDER_ELEMENT: &str = "folder";

pub const QT_ELEMENT: &str = "qt";
pub const QT_DESTDIR_ELEMENT: &str = "destdir";
pub const QT_TARGET_ELEMENT: &str = "target";
pub const QT_VERSION_ELEMENT: &str = "version";
pub const QT_BUILD_MODE_ELEMENT: &str = "buildMode";
pub const QT_SPEC_ELEMENT: &str = "qmakeSpec";
pub const QT_DEFS_LIST_ELEMENT: &str = "customDefs";

pub const DEFAULT_CONF_ELEMENT: &str = "defaultConf";

pub const CUSTOM_TOOL_COMMAND_LINE_ELEMENT: &str = "customToolCommandline";
pub const CUSTOM_TOOL_DESCRIPTION_ELEMENT: &str = "customToolDescription";
pub const CUSTOM_TOOL_OUTPUTS_ELEMENT: &str = "customToolOutputs";
pub const CUSTOM_TOOL_ADDITIONAL_DEP_ELEMENT: &str = "customToolAdditionalDep";

pub const TRUE_VALUE: &str = "true";
pub const FALSE_VALUE: &str = "false";
